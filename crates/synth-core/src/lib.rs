//! synth-core — shared types for the synthetic publication monitor.
//!
//! Holds the records that travel through the publish → verify → record
//! pipeline and the monitor configuration. Every other crate in the
//! workspace depends on this one; it has no async runtime dependency.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigFile, MonitorConfig, parse_duration};
pub use error::{ConfigError, ConfigResult};
pub use types::*;
