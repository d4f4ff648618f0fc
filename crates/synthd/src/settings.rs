//! Resolves `MonitorConfig` from defaults, an optional TOML file and CLI flags.

use std::path::PathBuf;

use clap::Args;
use synth_core::{ConfigFile, ConfigResult, MonitorConfig, parse_duration};

/// Flags shared by the subcommands. Unset flags fall back to the config
/// file, then to built-in defaults.
#[derive(Args, Debug, Default, Clone)]
pub struct MonitorArgs {
    /// TOML config file applied before the flags below.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Port to listen on.
    #[arg(long)]
    pub port: Option<u16>,

    /// Publish entrypoint host (e.g. the CMS notifier address).
    #[arg(long)]
    pub ingest_host: Option<String>,

    /// Authorization header value used when posting to the ingest host.
    #[arg(long, env = "SYNTH_INGEST_CREDENTIALS", hide_env_values = true)]
    pub ingest_credentials: Option<String>,

    /// Host header override for routing the ingest request through a shared proxy.
    #[arg(long)]
    pub ingest_host_header: Option<String>,

    /// Storage host the published image is read back from.
    #[arg(long)]
    pub storage_host: Option<String>,

    /// Periodically generate and post content.
    #[arg(long)]
    pub tick: Option<bool>,

    /// UUID of the synthetic image.
    #[arg(long)]
    pub test_uuid: Option<String>,

    /// Interval between scheduled publishes (e.g. "120s", "2m").
    #[arg(long, value_parser = duration_arg)]
    pub publish_interval: Option<std::time::Duration>,

    /// Wait after submission before reading the image back.
    #[arg(long, value_parser = duration_arg)]
    pub settle_window: Option<std::time::Duration>,

    /// Timeout for each outbound HTTP request.
    #[arg(long, value_parser = duration_arg)]
    pub request_timeout: Option<std::time::Duration>,

    /// Run kubectl remediation on verification outcomes.
    #[arg(long)]
    pub remediate: Option<bool>,
}

fn duration_arg(s: &str) -> Result<std::time::Duration, String> {
    parse_duration(s).ok_or_else(|| format!("invalid duration {s:?} (expected e.g. 30s, 500ms, 2m)"))
}

impl MonitorArgs {
    /// Build and validate the effective configuration.
    pub fn resolve(&self) -> ConfigResult<MonitorConfig> {
        let mut config = MonitorConfig::default();
        if let Some(ref path) = self.config {
            config.apply_file(&ConfigFile::from_file(path)?)?;
        }

        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(ref host) = self.ingest_host {
            config.ingest_host = host.clone();
        }
        if self.ingest_credentials.is_some() {
            config.ingest_credentials = self.ingest_credentials.clone();
        }
        if self.ingest_host_header.is_some() {
            config.ingest_host_header = self.ingest_host_header.clone();
        }
        if let Some(ref host) = self.storage_host {
            config.storage_host = host.clone();
        }
        if let Some(tick) = self.tick {
            config.tick = tick;
        }
        if let Some(ref uuid) = self.test_uuid {
            config.test_uuid = uuid.clone();
        }
        if let Some(interval) = self.publish_interval {
            config.publish_interval = interval;
        }
        if let Some(settle) = self.settle_window {
            config.settle_window = settle;
        }
        if let Some(timeout) = self.request_timeout {
            config.request_timeout = timeout;
        }
        if let Some(remediate) = self.remediate {
            config.remediate = remediate;
        }

        config.validate()?;
        Ok(config)
    }
}
