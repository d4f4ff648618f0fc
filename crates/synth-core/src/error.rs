//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating the monitor config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("{field} must not exceed {max:?}")]
    DurationTooLong {
        field: &'static str,
        max: std::time::Duration,
    },

    #[error("{0} must not be empty")]
    EmptyHost(&'static str),

    #[error("invalid test uuid {0:?}")]
    InvalidUuid(String),
}
