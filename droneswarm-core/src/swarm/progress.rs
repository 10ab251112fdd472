//! Progress Metric
//!
//! Coverage of the reachable logical area. Unreachable cells (obstacles) are
//! excluded from both counts.

use serde::{Deserialize, Serialize};

use super::grid::{Grid, Visit};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coverage {
    pub visited: usize,
    pub unvisited: usize,
}

impl Coverage {
    pub fn of(grid: &Grid) -> Self {
        let mut coverage = Coverage::default();
        for x in 0..grid.width() as i32 {
            for y in 0..grid.height() as i32 {
                match grid.visit(x, y) {
                    Visit::Visited => coverage.visited += 1,
                    Visit::Unvisited => coverage.unvisited += 1,
                    Visit::Unreachable => {}
                }
            }
        }
        coverage
    }

    pub fn reachable(&self) -> usize {
        self.visited + self.unvisited
    }

    /// Visited share of the reachable area in percent.
    ///
    /// A grid with no reachable cell has nothing left to explore and reports
    /// 100%.
    pub fn percent(&self) -> f64 {
        match self.reachable() {
            0 => 100.0,
            total => self.visited as f64 * 100.0 / total as f64,
        }
    }
}

/// Shorthand for `Coverage::of(grid).percent()`.
pub fn progress(grid: &Grid) -> f64 {
    Coverage::of(grid).percent()
}
