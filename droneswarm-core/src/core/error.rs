//! Error types for the drone swarm engine

/// Result type alias
pub type Result<T> = std::result::Result<T, SwarmError>;

/// Swarm engine error types
#[derive(Debug, thiserror::Error)]
pub enum SwarmError {
    /// Configuration rejected before the simulation starts
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Input raster does not cover the logical grid
    #[error(
        "{layer} raster is {width}x{height}, required minimum is {required_width}x{required_height}"
    )]
    RasterTooSmall {
        /// Which input layer the raster was meant for
        layer: &'static str,
        width: usize,
        height: usize,
        required_width: usize,
        required_height: usize,
    },

    /// Raster buffer length does not match its declared dimensions
    #[error("Raster buffer holds {actual} pixels, dimensions require {expected}")]
    RasterSize { expected: usize, actual: usize },

    /// A drone layer cell holds a value outside the known statuses.
    /// Indicates a logic defect; the tick that found it is discarded.
    #[error("Invalid drone status {value} at ({x}, {y})")]
    InvalidDroneStatus { x: i32, y: i32, value: i8 },

    /// Threshold not reached within the configured tick budget
    #[error("Tick limit of {ticks} reached at {progress:.2}% coverage")]
    TickLimit { ticks: u64, progress: f64 },

    /// All drones were removed before the threshold was reached
    #[error("Swarm extinct at tick {tick} with {progress:.2}% coverage")]
    Extinct { tick: u64, progress: f64 },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Layout image could not be read or decoded
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl SwarmError {
    /// Whether the error aborts a run because of an engine defect rather than
    /// a bad input or an unreachable goal.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, SwarmError::InvalidDroneStatus { .. })
    }
}
