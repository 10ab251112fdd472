use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SwarmError};
use crate::swarm::{LayoutConfig, SwarmConfig};

/// Driver configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Coverage percentage (0..=100) at which a run stops
    pub threshold: f64,
    /// Independent simulations per batch
    pub simulations: usize,
}

impl DriverConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.threshold) {
            return Err(SwarmError::Config(format!(
                "threshold must be within 0..=100, got {}",
                self.threshold
            )));
        }
        if self.simulations == 0 {
            return Err(SwarmError::Config("simulations must be positive".to_string()));
        }
        Ok(())
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        DriverConfig {
            threshold: 75.0,
            simulations: 10,
        }
    }
}

/// Top-level configuration for DroneSwarm
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DroneSwarmConfig {
    pub swarm: SwarmConfig,
    pub driver: DriverConfig,
    pub layout: LayoutConfig,
}

impl DroneSwarmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DroneSwarmConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        self.swarm.validate()?;
        self.driver.validate()?;
        self.layout.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(DroneSwarmConfig::new().validate().is_ok());
    }

    #[test]
    fn nested_json_overrides() {
        let cfg = DroneSwarmConfig::from_json_str(
            r#"{
                "swarm": { "grid_width": 64, "grid_height": 48, "seed": 7 },
                "driver": { "threshold": 90.0 },
                "layout": { "drone_count": 12 }
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.swarm.grid_width, 64);
        assert_eq!(cfg.swarm.seed, 7);
        assert_eq!(cfg.driver.threshold, 90.0);
        assert_eq!(cfg.driver.simulations, 10);
        assert_eq!(cfg.layout.drone_count, 12);
    }

    #[test]
    fn threshold_out_of_range_rejected() {
        let err = DroneSwarmConfig::from_json_str(r#"{"driver": {"threshold": 120.0}}"#).unwrap_err();
        assert!(matches!(err, SwarmError::Config(_)));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let err = DroneSwarmConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, SwarmError::Json(_)));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = DroneSwarmConfig::from_json_file("/nonexistent/droneswarm.json").unwrap_err();
        assert!(matches!(err, SwarmError::Io(_)));
    }
}
