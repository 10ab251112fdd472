//! Drone Decision Procedure
//!
//! Pure function from a big-zone window centred on a drone to the action the
//! drone takes this tick. Reads nothing but the window and the injected
//! random source, so decisions for different drones can run in parallel.
//!
//! Order of evaluation:
//! 1. previous-direction hint from the first empty cell around the drone
//! 2. visitation of the small zone (on the window copy, for scoring)
//! 3. candidate moves inside the logical grid
//! 4. hard exclusion of obstacles and occupied cells
//! 5. collision-avoidance scan of the big zone
//! 6. self-consistency checks
//! 7. exploration-priority selection
//! 8. final legality filter

use rand::seq::SliceRandom;
use rand::Rng;

use super::grid::{DroneStatus, Visit};
use super::window::Window;
use super::{BIG_ZONE_R, SMALL_ZONE_R};

/// Displacement `(dx, dy)` with both components in `-1..=1`.
pub type Offset = (i32, i32);

pub const STAY: Offset = (0, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemovalReason {
    /// Lost the parity tie-break against an adjacent drone.
    Collision,
    /// Drone sits on an obstacle cell.
    InsideObstacle,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// Every neighbor is blocked; only visitation applies this tick.
    Idle,
    /// Move by `offset` (possibly [`STAY`]). `stuck` is set when no candidate
    /// survived the final legality filter.
    Move { offset: Offset, stuck: bool },
    /// Remove the drone and its markers.
    Remove(RemovalReason),
}

/// Decide the action for the drone at the centre of `window`.
///
/// `window` must have radius [`BIG_ZONE_R`]. The visitation step is applied
/// to the window itself; the caller commits visitation to the grid separately.
pub fn decide<R: Rng + ?Sized>(window: &mut Window, rng: &mut R) -> Action {
    assert!(
        window.radius() >= BIG_ZONE_R,
        "decision window needs radius {BIG_ZONE_R}, got {}",
        window.radius()
    );

    let hint = previous_direction(window);
    visit_small_zone(window);

    if window.get(0, 0).obstacle {
        return Action::Remove(RemovalReason::InsideObstacle);
    }

    let mut candidates = candidate_moves(window);
    candidates.retain(|&(dx, dy)| {
        let cell = window.get(dx, dy);
        !cell.obstacle && cell.drone != DroneStatus::Here
    });
    if candidates.is_empty() {
        return Action::Idle;
    }

    if avoidance_scan(window, hint, &mut candidates) {
        return Action::Remove(RemovalReason::Collision);
    }

    if candidates.is_empty() {
        candidates.push(STAY);
    }
    if candidates.len() == 1 {
        let (dx, dy) = candidates[0];
        if window.get(dx, dy).obstacle {
            candidates = vec![STAY];
        }
    }

    let chosen = select_move(window, hint, &candidates, rng);

    // The chosen move stands unless no candidate at all survives the final
    // filter. Stepping onto a Vector cell (usually the drone's own heading
    // marker) is allowed; the engine overwrites it with Here.
    if candidates.iter().any(|&m| is_legal_target(window, m)) {
        Action::Move {
            offset: chosen,
            stuck: false,
        }
    } else {
        Action::Move {
            offset: STAY,
            stuck: true,
        }
    }
}

/// Forward-continuation hint: negation of the first neighbor without drone
/// data in scan order (dx ascending, then dy ascending). Obstacle and border
/// cells always read None, so next to a wall the hint points away from it.
pub fn previous_direction(window: &Window) -> Option<Offset> {
    small_zone_ring()
        .find(|&(dx, dy)| window.get(dx, dy).drone == DroneStatus::None)
        .map(|(dx, dy)| (-dx, -dy))
}

fn visit_small_zone(window: &mut Window) {
    for dx in -SMALL_ZONE_R..=SMALL_ZONE_R {
        for dy in -SMALL_ZONE_R..=SMALL_ZONE_R {
            let cell = window.get_mut(dx, dy);
            if cell.visit == Visit::Unvisited {
                cell.visit = Visit::Visited;
            }
        }
    }
}

/// The eight unit moves that keep the drone inside the logical grid.
fn candidate_moves(window: &Window) -> Vec<Offset> {
    small_zone_ring()
        .filter(|&(dx, dy)| window.in_logical_bounds(dx, dy))
        .collect()
}

/// Collision-avoidance scan over the big zone. Returns whether the drone
/// lost a parity tie-break and must be removed.
///
/// Once a reflex ("thrust away") move is set, the candidate set is frozen.
/// The scan still runs to the end so that every adjacent drone gets its
/// removal check, which keeps the tie-break symmetric between the pair.
fn avoidance_scan(window: &Window, hint: Option<Offset>, candidates: &mut Vec<Offset>) -> bool {
    let came_from = hint.map(|(hx, hy)| (-hx, -hy));
    let centre = *window.get(0, 0);
    let mut thrust_away = false;
    let mut remove = false;

    for dx in -BIG_ZONE_R..=BIG_ZONE_R {
        for dy in -BIG_ZONE_R..=BIG_ZONE_R {
            if (dx, dy) == STAY {
                continue;
            }
            let status = window.get(dx, dy).drone;

            if dx.abs() <= SMALL_ZONE_R && dy.abs() <= SMALL_ZONE_R {
                if status != DroneStatus::Here {
                    continue;
                }
                if !thrust_away {
                    *candidates = vec![(-dx, -dy)];
                    thrust_away = true;
                }
                // Orthogonal neighbors disagree on the checkerboard, diagonal
                // neighbors disagree on column parity.
                let flag = if dx.abs() != dy.abs() {
                    centre.parity_a
                } else {
                    centre.parity_b
                };
                remove |= flag;
                continue;
            }

            if thrust_away {
                continue;
            }
            match status {
                DroneStatus::Near => {
                    if dx == BIG_ZONE_R {
                        candidates.retain(|m| m.0 != 1);
                    }
                    if dx == -BIG_ZONE_R {
                        candidates.retain(|m| m.0 != -1);
                    }
                    if dy == BIG_ZONE_R {
                        candidates.retain(|m| m.1 != 1);
                    }
                    if dy == -BIG_ZONE_R {
                        candidates.retain(|m| m.1 != -1);
                    }
                }
                DroneStatus::Vector | DroneStatus::Here => {
                    let heading = (halve(dx), halve(dy));
                    if Some(heading) == came_from {
                        continue;
                    }
                    *candidates = vec![(-heading.0, -heading.1)];
                    thrust_away = true;
                }
                _ => {}
            }
        }
    }
    remove
}

#[inline]
fn halve(c: i32) -> i32 {
    if c.abs() > 1 {
        c / 2
    } else {
        c
    }
}

/// Exploration priority: the candidate opening the most unvisited cells wins,
/// ties broken uniformly. With no gain anywhere, keep heading along `hint` if
/// it is still a candidate, otherwise pick any candidate.
fn select_move<R: Rng + ?Sized>(
    window: &Window,
    hint: Option<Offset>,
    candidates: &[Offset],
    rng: &mut R,
) -> Offset {
    if candidates.len() > 1 {
        let scored: Vec<(Offset, usize)> = candidates
            .iter()
            .map(|&m| (m, window.unvisited_around(m.0, m.1)))
            .filter(|&(_, gain)| gain > 0)
            .collect();
        if let Some(best_gain) = scored.iter().map(|&(_, gain)| gain).max() {
            let best: Vec<Offset> = scored
                .iter()
                .filter(|&&(_, gain)| gain == best_gain)
                .map(|&(m, _)| m)
                .collect();
            return best.choose(rng).copied().unwrap_or(STAY);
        }
    }

    match hint {
        Some(h) if candidates.contains(&h) => h,
        _ => candidates.choose(rng).copied().unwrap_or(STAY),
    }
}

fn is_legal_target(window: &Window, (dx, dy): Offset) -> bool {
    if (dx, dy) == STAY || !window.in_logical_bounds(dx, dy) {
        return false;
    }
    let cell = window.get(dx, dy);
    !cell.obstacle && !matches!(cell.drone, DroneStatus::Here | DroneStatus::Vector)
}

/// Non-zero offsets of the small zone in scan order.
fn small_zone_ring() -> impl Iterator<Item = Offset> {
    (-SMALL_ZONE_R..=SMALL_ZONE_R)
        .flat_map(|dx| (-SMALL_ZONE_R..=SMALL_ZONE_R).map(move |dy| (dx, dy)))
        .filter(|&m| m != STAY)
}
