//! DroneSwarm Core - Cellular-Automaton Area Coverage
//!
//! This library simulates a swarm of drones exploring a 2-D occupancy grid.
//! Every drone decides its move from a small window of the grid, all
//! decisions of a tick are applied synchronously, and progress is the share
//! of reachable cells that have been visited.

pub mod core;
pub mod swarm;
pub mod utils;

pub use crate::core::config::{DriverConfig, DroneSwarmConfig};
pub use crate::core::error::{Result, SwarmError};
pub use swarm::{
    run_batch, run_batch_on_layout, run_on_layout, run_simulation, run_until_threshold, Grid,
    GridSnapshot, LayoutConfig, Raster, RunOutcome, SwarmConfig, SwarmEngine, TickReport,
};
pub use utils::benchmark::BatchStats;

/// Initialize the tracing subscriber.
///
/// `level` is an `EnvFilter` directive such as `"info"` or
/// `"droneswarm_core=debug"`; `RUST_LOG` style syntax applies.
pub fn setup_logging(level: Option<String>) {
    let filter = level.unwrap_or_else(|| "info".to_string());
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
