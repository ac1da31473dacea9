//! Core error types for gapline-core.
//!
//! Layout itself never fails: malformed input degrades to a best-effort
//! result. The errors below cover the edges where a caller can still act on
//! a failure (config files, document parsing, civil-time conversion).

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for gapline-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Instant parsing errors
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// Civil-time conversion errors
    #[error("Time conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("{0}")]
    Custom(String),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Errors produced when reading an instant from its textual form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Invalid instant '{raw}': {message}")]
    InvalidInstant { raw: String, message: String },
}

/// Errors produced when converting an instant into a reference civil timezone.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// The zone name is not in the tz database
    #[error("Unknown timezone '{name}'")]
    UnknownZone { name: String },

    /// A naive civil time has no single instant in the zone (DST fold or gap)
    #[error("Civil time {time} is ambiguous or skipped in '{zone}'")]
    AmbiguousLocalTime { zone: String, time: String },
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::ParseFailed(err.to_string())
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
