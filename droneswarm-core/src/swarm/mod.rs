//! Swarm Engine
//!
//! Cellular-automaton drone swarm: a padded, layered grid in struct-of-arrays
//! layout, a per-drone decision procedure over a local window, and a
//! synchronous update engine that commits every decision into a fresh grid.

pub mod coverage_test;
pub mod decision;
pub mod driver;
pub mod engine;
pub mod grid;
pub mod layout;
pub mod progress;
pub mod raster;
pub mod window;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SwarmError};

pub use decision::{decide, Action, Offset, RemovalReason, STAY};
pub use driver::{
    run_batch, run_batch_on_layout, run_on_layout, run_simulation, run_until_threshold, RunOutcome,
};
pub use engine::{SwarmEngine, TickReport};
pub use grid::{DroneStatus, Grid, GridSnapshot, Layer, Visit};
pub use layout::{generate_layout, LayoutConfig};
pub use progress::Coverage;
pub use raster::Raster;
pub use window::{CellState, Window};

/// Radius of the sensing and collision lookahead window ("big zone").
pub const BIG_ZONE_R: i32 = 2;
/// Radius of the move neighborhood and of visitation ("small zone").
pub const SMALL_ZONE_R: i32 = 1;
/// Minimum border width; every big-zone lookup from an in-bounds cell stays inside it.
pub const MIN_PADDING: usize = BIG_ZONE_R as usize;

/// Configuration for the Swarm Engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Logical grid width in cells
    pub grid_width: usize,
    /// Logical grid height in cells
    pub grid_height: usize,
    /// Border width around the logical area
    pub padding: usize,
    /// Seed for the per-drone tie-break generators
    pub seed: u64,
    /// Run the decision phase on the rayon pool
    pub parallel: bool,
    /// Tick budget for a single run-until-threshold
    pub max_ticks: u64,
}

impl SwarmConfig {
    pub fn new(grid_width: usize, grid_height: usize) -> Self {
        SwarmConfig {
            grid_width,
            grid_height,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_width == 0 || self.grid_height == 0 {
            return Err(SwarmError::Config(format!(
                "grid dimensions must be non-zero, got {}x{}",
                self.grid_width, self.grid_height
            )));
        }
        if self.padding < MIN_PADDING {
            return Err(SwarmError::Config(format!(
                "padding must be at least {}, got {}",
                MIN_PADDING, self.padding
            )));
        }
        if i32::try_from(self.grid_width + 2 * self.padding).is_err()
            || i32::try_from(self.grid_height + 2 * self.padding).is_err()
        {
            return Err(SwarmError::Config("grid dimensions overflow i32".to_string()));
        }
        if self.max_ticks == 0 {
            return Err(SwarmError::Config("max_ticks must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for SwarmConfig {
    fn default() -> Self {
        SwarmConfig {
            grid_width: 128,
            grid_height: 128,
            padding: MIN_PADDING,
            seed: 0x5EED_D20E,
            parallel: true,
            max_ticks: 100_000,
        }
    }
}
