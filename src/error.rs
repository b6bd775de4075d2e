//! Error types for examguard.

use thiserror::Error;

/// Errors that can occur in the monitoring engine and its supporting plumbing.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("sensor feed is already running")]
    SensorAlreadyRunning,

    #[error("sensor feed disconnected")]
    SensorDisconnected,

    #[error("calibration point {0} is out of range")]
    InvalidCalibrationPoint(usize),
}
