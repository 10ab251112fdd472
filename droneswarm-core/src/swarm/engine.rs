//! Grid Update Engine
//!
//! One tick = decide against the current grid, commit into the next grid,
//! swap. Decisions never see partially committed state, so the decision
//! phase can fan out on rayon. Commits are serial in row-major drone order;
//! when two drones target the same cell the one earlier in that order
//! (lowest x, then lowest y) takes it and the other stays in place.

use std::collections::HashSet;
use std::mem::swap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use super::decision::{decide, Action, Offset, RemovalReason, STAY};
use super::grid::{DroneStatus, Grid};
use super::progress::Coverage;
use super::raster::Raster;
use super::{SwarmConfig, BIG_ZONE_R, SMALL_ZONE_R};
use crate::core::error::{Result, SwarmError};

/// Per-tick counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickReport {
    /// Tick number just completed (1-based)
    pub tick: u64,
    /// Drones alive after the tick
    pub drones: usize,
    /// Drones that changed cell
    pub moved: usize,
    /// Drones removed this tick
    pub removed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Outcome {
    Stayed,
    Moved,
    Removed(RemovalReason),
}

/// Owns the current and next grid buffers for the lifetime of a simulation.
pub struct SwarmEngine {
    config: SwarmConfig,
    grid: Grid,
    next: Grid,
    tick: u64,
}

impl SwarmEngine {
    pub fn new(config: SwarmConfig, grid: Grid) -> Result<Self> {
        config.validate()?;
        if (grid.width(), grid.height(), grid.padding())
            != (config.grid_width, config.grid_height, config.padding)
        {
            return Err(SwarmError::Config(format!(
                "grid is {}x{} (padding {}), config expects {}x{} (padding {})",
                grid.width(),
                grid.height(),
                grid.padding(),
                config.grid_width,
                config.grid_height,
                config.padding
            )));
        }
        let next = grid.clone();
        Ok(SwarmEngine {
            config,
            grid,
            next,
            tick: 0,
        })
    }

    pub fn from_rasters(config: SwarmConfig, obstacles: &Raster, drones: &Raster) -> Result<Self> {
        let grid = Grid::from_rasters(&config, obstacles, drones)?;
        Self::new(config, grid)
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    /// Current grid, for rendering and inspection.
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Mutable access to the current grid between ticks.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn into_grid(self) -> Grid {
        self.grid
    }

    /// Ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn coverage(&self) -> Coverage {
        Coverage::of(&self.grid)
    }

    /// Visited percentage of the reachable area.
    pub fn progress(&self) -> f64 {
        self.coverage().percent()
    }

    /// Advance one tick.
    ///
    /// Fails with [`SwarmError::InvalidDroneStatus`] if the drone layer holds
    /// an unknown value; the current grid is left untouched in that case.
    pub fn step(&mut self) -> Result<TickReport> {
        let (drones, markers) = scan_drone_layer(&self.grid)?;
        self.tick += 1;

        let mut report = TickReport {
            tick: self.tick,
            ..TickReport::default()
        };
        if drones.is_empty() {
            return Ok(report);
        }

        self.next.copy_from(&self.grid);
        sweep_stale_markers(&self.grid, &mut self.next, &markers);

        let actions = self.decide_all(&drones);

        let mut claimed: HashSet<(i32, i32)> = HashSet::with_capacity(drones.len());
        for (&origin, &action) in drones.iter().zip(actions.iter()) {
            match commit(&mut self.next, &mut claimed, origin, action) {
                Outcome::Moved => report.moved += 1,
                Outcome::Stayed => {}
                Outcome::Removed(reason) => {
                    report.removed += 1;
                    if reason == RemovalReason::InsideObstacle {
                        warn!(
                            "[Engine] Tick {}: drone at ({}, {}) is inside an obstacle, removing it",
                            self.tick, origin.0, origin.1
                        );
                    }
                }
            }
        }

        swap(&mut self.grid, &mut self.next);
        report.drones = claimed.len();
        debug!(
            "[Engine] Tick {}: {} drones, {} moved, {} removed",
            report.tick, report.drones, report.moved, report.removed
        );
        Ok(report)
    }

    fn decide_all(&self, drones: &[(i32, i32)]) -> Vec<Action> {
        let grid = &self.grid;
        let seed = self.config.seed;
        let tick = self.tick;
        let decide_one = move |&(x, y): &(i32, i32)| {
            let mut window = grid.extract_window(x, y, BIG_ZONE_R);
            let mut rng = drone_rng(seed, tick, x, y);
            decide(&mut window, &mut rng)
        };

        if self.config.parallel {
            drones.par_iter().map(decide_one).collect()
        } else {
            drones.iter().map(decide_one).collect()
        }
    }
}

/// Tie-break generator for one drone in one tick. Keyed on position so the
/// result does not depend on which thread decides the drone.
fn drone_rng(seed: u64, tick: u64, x: i32, y: i32) -> StdRng {
    let key = seed
        ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (x as u32 as u64).wrapping_mul(2654435761)
        ^ ((y as u32 as u64) << 32).wrapping_mul(2246822519);
    StdRng::seed_from_u64(key)
}

/// Row-major drone positions and marker positions of the logical area.
fn scan_drone_layer(grid: &Grid) -> Result<(Vec<(i32, i32)>, Vec<(i32, i32)>)> {
    let mut drones = Vec::new();
    let mut markers = Vec::new();
    for x in 0..grid.width() as i32 {
        for y in 0..grid.height() as i32 {
            match grid.drone(x, y) {
                DroneStatus::None => {}
                DroneStatus::Here => drones.push((x, y)),
                DroneStatus::Near | DroneStatus::Vector => markers.push((x, y)),
                DroneStatus::Unknown(value) => {
                    error!("[Engine] Invalid drone status {} at ({}, {})", value, x, y);
                    return Err(SwarmError::InvalidDroneStatus { x, y, value });
                }
            }
        }
    }
    Ok((drones, markers))
}

/// Markers with no drone next to them in the current grid are dropped.
fn sweep_stale_markers(grid: &Grid, next: &mut Grid, markers: &[(i32, i32)]) {
    for &(x, y) in markers {
        if !grid.extract_window(x, y, SMALL_ZONE_R).has_drone_within(SMALL_ZONE_R) {
            next.set_drone(x, y, DroneStatus::None);
        }
    }
}

fn commit(
    next: &mut Grid,
    claimed: &mut HashSet<(i32, i32)>,
    origin: (i32, i32),
    action: Action,
) -> Outcome {
    let (x, y) = origin;
    for (dx, dy) in square(SMALL_ZONE_R) {
        next.mark_visited(x + dx, y + dy);
    }

    match action {
        Action::Idle => {
            next.set_drone(x, y, DroneStatus::Here);
            claimed.insert(origin);
            Outcome::Stayed
        }
        Action::Remove(reason) => {
            for (dx, dy) in ring(SMALL_ZONE_R) {
                if next.drone(x + dx, y + dy).is_marker() {
                    next.set_drone(x + dx, y + dy, DroneStatus::None);
                }
            }
            if !claimed.contains(&origin) {
                next.set_drone(x, y, DroneStatus::None);
            }
            Outcome::Removed(reason)
        }
        Action::Move { offset, stuck } => relocate(next, claimed, origin, offset, stuck),
    }
}

fn relocate(
    next: &mut Grid,
    claimed: &mut HashSet<(i32, i32)>,
    origin: (i32, i32),
    offset: Offset,
    stuck: bool,
) -> Outcome {
    let (x, y) = origin;
    let relocating = offset != STAY;

    // Old annotations. A Here next to a relocating drone is a stale copy of a
    // drone that has not committed yet; it rewrites its own marker when it does.
    for (dx, dy) in ring(SMALL_ZONE_R) {
        let p = (x + dx, y + dy);
        match next.drone(p.0, p.1) {
            s if s.is_marker() => next.set_drone(p.0, p.1, DroneStatus::None),
            DroneStatus::Here if relocating && !claimed.contains(&p) => {
                next.set_drone(p.0, p.1, DroneStatus::None)
            }
            _ => {}
        }
    }

    if stuck {
        for (dx, dy) in ring(BIG_ZONE_R) {
            if next.drone(x + dx, y + dy).is_marker() {
                next.set_drone(x + dx, y + dy, DroneStatus::None);
            }
        }
    }

    let mut target = (x + offset.0, y + offset.1);
    if claimed.contains(&target) {
        target = origin;
    }
    next.set_drone(target.0, target.1, DroneStatus::Here);
    claimed.insert(target);

    for (dx, dy) in ring(SMALL_ZONE_R) {
        let p = (target.0 + dx, target.1 + dy);
        if !next.is_obstacle(p.0, p.1)
            && matches!(next.drone(p.0, p.1), DroneStatus::None | DroneStatus::Vector)
        {
            next.set_drone(p.0, p.1, DroneStatus::Near);
        }
    }

    if target == origin {
        return Outcome::Stayed;
    }

    next.set_drone(x, y, DroneStatus::None);
    let heading = (target.0 + offset.0, target.1 + offset.1);
    if !next.is_obstacle(heading.0, heading.1)
        && matches!(
            next.drone(heading.0, heading.1),
            DroneStatus::None | DroneStatus::Near
        )
    {
        next.set_drone(heading.0, heading.1, DroneStatus::Vector);
    }
    Outcome::Moved
}

/// All offsets with Chebyshev distance <= `r`, centre included.
fn square(r: i32) -> impl Iterator<Item = Offset> {
    (-r..=r).flat_map(move |dx| (-r..=r).map(move |dy| (dx, dy)))
}

/// Offsets with Chebyshev distance exactly `r`.
fn ring(r: i32) -> impl Iterator<Item = Offset> {
    square(r).filter(move |&(dx, dy)| dx.abs().max(dy.abs()) == r)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swarm::grid::Visit;
    use crate::swarm::layout::generate_layout;
    use crate::swarm::LayoutConfig;
    use proptest::prelude::*;

    fn engine(w: usize, h: usize, drones: &[(usize, usize)], obstacles: &[(usize, usize)]) -> SwarmEngine {
        SwarmEngine::from_rasters(
            SwarmConfig::new(w, h).with_parallel(false),
            &Raster::from_points(w, h, obstacles),
            &Raster::from_points(w, h, drones),
        )
        .unwrap()
    }

    fn assert_grid_invariants(grid: &Grid) {
        let w = grid.width() as i32;
        let h = grid.height() as i32;
        for x in 0..w {
            for y in 0..h {
                if grid.is_obstacle(x, y) {
                    assert_eq!(grid.visit(x, y), Visit::Unreachable, "obstacle ({x},{y}) reachable");
                    assert_eq!(grid.drone(x, y), DroneStatus::None, "obstacle ({x},{y}) carries drone data");
                }
                assert!(!matches!(grid.drone(x, y), DroneStatus::Unknown(_)));
            }
        }
    }

    #[test]
    fn single_drone_on_open_grid() {
        let mut e = engine(5, 5, &[(2, 2)], &[]);
        let report = e.step().unwrap();
        assert_eq!(report, TickReport { tick: 1, drones: 1, moved: 1, removed: 0 });

        let g = e.grid();
        for x in 1..=3 {
            for y in 1..=3 {
                assert_eq!(g.visit(x, y), Visit::Visited);
            }
        }
        assert_eq!(e.coverage().visited, 9);

        let drones = g.drones();
        assert_eq!(drones.len(), 1);
        let (nx, ny) = drones[0];
        // Diagonal neighbors of the centre expose the most unvisited cells.
        assert_eq!(((nx - 2).abs(), (ny - 2).abs()), (1, 1));
        assert_eq!(g.drone(2, 2), DroneStatus::None);
        assert_eq!(g.drone(2 * nx - 2, 2 * ny - 2), DroneStatus::Vector);
    }

    #[test]
    fn lone_drone_moves_every_tick() {
        let mut e = engine(40, 40, &[(20, 20)], &[]);
        let mut last = (20, 20);
        for tick in 1..=15 {
            let report = e.step().unwrap();
            assert_eq!(report.moved, 1, "drone idled on tick {tick}");
            let drones = e.grid().drones();
            assert_eq!(drones.len(), 1);
            assert_ne!(drones[0], last);
            last = drones[0];
        }
    }

    #[test]
    fn adjacent_pair_loses_exactly_one_drone() {
        for &(a, b) in &[((2, 2), (3, 2)), ((2, 2), (2, 3)), ((3, 3), (4, 3)), ((3, 3), (3, 4))] {
            let mut first = None;
            for _ in 0..3 {
                let mut e = engine(8, 8, &[a, b], &[]);
                let report = e.step().unwrap();
                assert_eq!(report.removed, 1);
                assert_eq!(e.grid().drone_count(), 1);
                let survivors = e.grid().drones();
                match &first {
                    None => first = Some(survivors),
                    Some(prev) => assert_eq!(prev, &survivors),
                }
            }
        }
    }

    #[test]
    fn blocked_drone_keeps_its_cell() {
        let mut e = engine(3, 3, &[(0, 0)], &[(1, 0), (0, 1), (1, 1)]);
        e.step().unwrap();
        assert_eq!(e.grid().drones(), vec![(0, 0)]);
        assert_eq!(e.grid().visit(0, 0), Visit::Visited);
    }

    #[test]
    fn drone_in_corridor_stays_when_thrust_hits_wall() {
        let mut e = engine(5, 5, &[(0, 2)], &[]);
        e.grid_mut().set_drone(2, 2, DroneStatus::Vector);
        let report = e.step().unwrap();
        assert_eq!(report.moved, 0);
        assert_eq!(e.grid().drones(), vec![(0, 2)]);
        // Stale vector two cells out was swept.
        assert_eq!(e.grid().drone(2, 2), DroneStatus::None);
    }

    #[test]
    fn drone_spawned_inside_obstacle_is_healed() {
        let mut e = engine(5, 5, &[(0, 0)], &[(3, 3)]);
        e.grid_mut().set_drone(3, 3, DroneStatus::Here);
        let report = e.step().unwrap();
        assert_eq!(report.removed, 1);
        assert_eq!(e.grid().drone(3, 3), DroneStatus::None);
        assert_eq!(e.grid().visit(3, 3), Visit::Unreachable);
        assert_grid_invariants(e.grid());
    }

    #[test]
    fn unknown_status_aborts_tick() {
        let mut e = engine(4, 4, &[(1, 1)], &[]);
        e.grid_mut().set_drone(2, 3, DroneStatus::Unknown(42));
        let before = e.grid().clone();
        let err = e.step().unwrap_err();
        assert!(matches!(err, SwarmError::InvalidDroneStatus { x: 2, y: 3, value: 42 }));
        assert_eq!(e.grid(), &before);
        assert_eq!(e.tick_count(), 0);
    }

    #[test]
    fn empty_swarm_tick_is_noop() {
        let mut e = engine(6, 6, &[], &[(1, 1), (4, 2)]);
        let before = e.grid().clone();
        let report = e.step().unwrap();
        assert_eq!(report.drones, 0);
        assert_eq!(e.grid(), &before);
        assert_eq!(e.tick_count(), 1);
    }

    #[test]
    fn orphaned_markers_are_swept() {
        let mut e = engine(8, 8, &[(7, 7)], &[]);
        e.grid_mut().set_drone(1, 1, DroneStatus::Near);
        e.grid_mut().set_drone(2, 1, DroneStatus::Vector);
        e.step().unwrap();
        assert_eq!(e.grid().drone(1, 1), DroneStatus::None);
        assert_eq!(e.grid().drone(2, 1), DroneStatus::None);
    }

    #[test]
    fn contested_cell_goes_to_lower_coordinate() {
        let g = Grid::from_rasters(
            &SwarmConfig::new(9, 9),
            &Raster::empty(9, 9),
            &Raster::from_points(9, 9, &[(2, 4), (4, 4)]),
        )
        .unwrap();
        let mut next = g.clone();
        let mut claimed = HashSet::new();
        let a = commit(&mut next, &mut claimed, (2, 4), Action::Move { offset: (1, 0), stuck: false });
        let b = commit(&mut next, &mut claimed, (4, 4), Action::Move { offset: (-1, 0), stuck: false });
        assert_eq!(a, Outcome::Moved);
        assert_eq!(b, Outcome::Stayed);
        assert_eq!(next.drones(), vec![(3, 4), (4, 4)]);
    }

    #[test]
    fn parallel_and_serial_runs_agree() {
        let layout = LayoutConfig { obstacle_density: 0.1, drone_count: 20 };
        let cfg = SwarmConfig::new(24, 24).with_seed(99);
        let (obstacles, drones) = generate_layout(&cfg, &layout, 7);

        let mut serial =
            SwarmEngine::from_rasters(cfg.clone().with_parallel(false), &obstacles, &drones).unwrap();
        let mut parallel =
            SwarmEngine::from_rasters(cfg.with_parallel(true), &obstacles, &drones).unwrap();
        for _ in 0..25 {
            assert_eq!(serial.step().unwrap(), parallel.step().unwrap());
            assert_eq!(serial.grid(), parallel.grid());
        }
    }

    #[test]
    fn ring_and_square_shapes() {
        assert_eq!(square(1).count(), 9);
        assert_eq!(ring(1).count(), 8);
        assert_eq!(ring(2).count(), 16);
        assert!(!ring(2).any(|(dx, dy)| dx.abs() < 2 && dy.abs() < 2));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn tick_invariants_hold(
            seed in any::<u64>(),
            layout_seed in any::<u64>(),
            density in 0.0f64..0.35,
            drone_count in 0usize..40,
            ticks in 1usize..12,
        ) {
            let cfg = SwarmConfig::new(16, 12).with_seed(seed).with_parallel(false);
            let layout = LayoutConfig { obstacle_density: density, drone_count };
            let (obstacles, drones) = generate_layout(&cfg, &layout, layout_seed);
            let mut e = SwarmEngine::from_rasters(cfg, &obstacles, &drones).unwrap();
            assert_grid_invariants(e.grid());

            for _ in 0..ticks {
                let before = e.grid().clone();
                let report = e.step().unwrap();
                let after = e.grid();

                prop_assert!(after.drone_count() <= before.drone_count());
                prop_assert_eq!(after.drone_count(), report.drones);
                assert_grid_invariants(after);

                for x in 0..after.width() as i32 {
                    for y in 0..after.height() as i32 {
                        match before.visit(x, y) {
                            Visit::Visited => prop_assert_eq!(after.visit(x, y), Visit::Visited),
                            Visit::Unreachable => prop_assert_eq!(after.visit(x, y), Visit::Unreachable),
                            Visit::Unvisited => prop_assert_ne!(after.visit(x, y), Visit::Unreachable),
                        }
                        prop_assert_eq!(after.is_obstacle(x, y), before.is_obstacle(x, y));
                        prop_assert_eq!(after.parity_a(x, y), before.parity_a(x, y));
                        prop_assert_eq!(after.parity_b(x, y), before.parity_b(x, y));
                    }
                }
            }
        }
    }
}
