//! Configuration and error types shared by the swarm modules.

pub mod config;
pub mod error;

pub use config::{DriverConfig, DroneSwarmConfig};
pub use error::{Result, SwarmError};
