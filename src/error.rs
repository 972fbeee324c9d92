//! Error types shared across the service
//!
//! None of these are fatal: every failure is caught at the boundary where it
//! happens, logged, and the single affected operation is dropped.

use thiserror::Error;

/// Failures while reading, parsing or persisting the user configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config must be a JSON object")]
    NotAnObject,

    #[error("unsupported config version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },
}

/// Failures reported by host collaborators (window surfaces, system services)
#[derive(Debug, Error)]
pub enum HostError {
    #[error("host service unavailable: {0}")]
    Unavailable(&'static str),

    #[error("host rejected request: {0}")]
    Rejected(String),
}

/// Delivery failure to a remote open-count observer
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("listener disconnected")]
    Disconnected,
}

/// Failures talking to the service itself
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("window service has stopped")]
    Stopped,

    #[error("failed to start window service: {0}")]
    Io(#[from] std::io::Error),
}
