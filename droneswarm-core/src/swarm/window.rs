//! Neighborhood view: a detached copy of the cells around a drone.

use super::grid::{DroneStatus, Grid, Layer, Visit};

/// All layers of one cell, copied out of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellState {
    pub obstacle: bool,
    pub drone: DroneStatus,
    pub visit: Visit,
    pub scratch: i8,
    pub parity_a: bool,
    pub parity_b: bool,
}

/// Square patch of side `2 * radius + 1`, addressed by offset from the centre.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Window {
    radius: i32,
    center: (i32, i32),
    grid_width: usize,
    grid_height: usize,
    cells: Vec<CellState>,
}

impl Window {
    pub(crate) fn extract(grid: &Grid, cx: i32, cy: i32, radius: i32) -> Self {
        let side = (2 * radius + 1) as usize;
        let mut cells = Vec::with_capacity(side * side);
        for dx in -radius..=radius {
            for dy in -radius..=radius {
                let (x, y) = (cx + dx, cy + dy);
                cells.push(CellState {
                    obstacle: grid.is_obstacle(x, y),
                    drone: grid.drone(x, y),
                    visit: grid.visit(x, y),
                    scratch: grid.get_layer(x, y, Layer::Scratch),
                    parity_a: grid.parity_a(x, y),
                    parity_b: grid.parity_b(x, y),
                });
            }
        }
        Window {
            radius,
            center: (cx, cy),
            grid_width: grid.width(),
            grid_height: grid.height(),
            cells,
        }
    }

    pub fn radius(&self) -> i32 {
        self.radius
    }

    /// Grid coordinates of the centre cell.
    pub fn center(&self) -> (i32, i32) {
        self.center
    }

    #[inline]
    fn slot(&self, dx: i32, dy: i32) -> usize {
        assert!(
            dx.abs() <= self.radius && dy.abs() <= self.radius,
            "offset ({dx}, {dy}) outside window of radius {}",
            self.radius
        );
        let side = 2 * self.radius + 1;
        ((dx + self.radius) * side + (dy + self.radius)) as usize
    }

    #[inline]
    pub fn get(&self, dx: i32, dy: i32) -> &CellState {
        &self.cells[self.slot(dx, dy)]
    }

    #[inline]
    pub fn get_mut(&mut self, dx: i32, dy: i32) -> &mut CellState {
        let i = self.slot(dx, dy);
        &mut self.cells[i]
    }

    /// Whether the cell at this offset lies in the logical (unpadded) grid.
    pub fn in_logical_bounds(&self, dx: i32, dy: i32) -> bool {
        let (x, y) = (self.center.0 + dx, self.center.1 + dy);
        x >= 0 && y >= 0 && (x as usize) < self.grid_width && (y as usize) < self.grid_height
    }

    /// Any Here cell within `radius` of the centre, centre included.
    pub fn has_drone_within(&self, radius: i32) -> bool {
        let r = radius.min(self.radius);
        (-r..=r).any(|dx| (-r..=r).any(|dy| self.get(dx, dy).drone == DroneStatus::Here))
    }

    /// Unvisited cells in the 3x3 block around `(dx, dy)`. The block must fit
    /// inside the window.
    pub fn unvisited_around(&self, dx: i32, dy: i32) -> usize {
        let mut count = 0;
        for ox in -1..=1 {
            for oy in -1..=1 {
                if self.get(dx + ox, dy + oy).visit == Visit::Unvisited {
                    count += 1;
                }
            }
        }
        count
    }
}
