//! Error types for the fallible edges of the crate.
//!
//! The detector itself never fails; these cover configuration and the
//! monitor's input/output.

use thiserror::Error;

/// Errors raised while reading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Raw value found.
        value: String,
        /// What was expected.
        reason: &'static str,
    },
}

/// Errors that end the monitor.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode output: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to install log subscriber: {0}")]
    Telemetry(#[from] tracing::subscriber::SetGlobalDefaultError),
}
