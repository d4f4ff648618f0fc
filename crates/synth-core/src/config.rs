//! Monitor configuration.
//!
//! `MonitorConfig` is the resolved, typed configuration handed to the
//! pipeline at construction. It starts from built-in defaults, can be
//! layered with a TOML `ConfigFile`, and is finally overridden by CLI
//! flags in `synthd`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_INGEST_HOST: &str = "cms-notifier-pr-uk-int.svc.ft.com";
pub const DEFAULT_STORAGE_HOST: &str = "com.ft.imagepublish.int.s3.amazonaws.com";
pub const DEFAULT_TEST_UUID: &str = "c94a3a57-3c99-423c-a6bd-ed8c4c10a3c3";

/// Upper bound for every configured duration.
pub const MAX_DURATION: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolved configuration for one monitor process.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Port the HTTP surface listens on.
    pub port: u16,
    /// Ingestion host (records are posted to `http://{host}/notify`).
    pub ingest_host: String,
    /// `Authorization` header value for ingestion, if any.
    pub ingest_credentials: Option<String>,
    /// `Host` header override for ingestion requests routed through a shared proxy.
    pub ingest_host_header: Option<String>,
    /// Storage host (objects are read from `http://{host}/{uuid}`).
    pub storage_host: String,
    /// Whether the periodic publisher runs.
    pub tick: bool,
    /// Fixed identifier of the synthetic object.
    pub test_uuid: String,
    pub publish_interval: Duration,
    /// Wait between submission and the storage read.
    pub settle_window: Duration,
    /// Upper bound for every outbound HTTP request.
    pub request_timeout: Duration,
    /// Run kubectl remediation on verification outcomes.
    pub remediate: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            ingest_host: DEFAULT_INGEST_HOST.to_string(),
            ingest_credentials: None,
            ingest_host_header: None,
            storage_host: DEFAULT_STORAGE_HOST.to_string(),
            tick: true,
            test_uuid: DEFAULT_TEST_UUID.to_string(),
            publish_interval: Duration::from_secs(120),
            settle_window: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
            remediate: false,
        }
    }
}

impl MonitorConfig {
    /// Ingestion submission URL.
    pub fn ingest_endpoint(&self) -> String {
        format!("http://{}/notify", self.ingest_host)
    }

    /// Storage URL of the synthetic object.
    pub fn storage_endpoint(&self) -> String {
        format!("http://{}/{}", self.storage_host, self.test_uuid)
    }

    /// Overlay every value present in `file`.
    pub fn apply_file(&mut self, file: &ConfigFile) -> ConfigResult<()> {
        if let Some(port) = file.port {
            self.port = port;
        }
        if let Some(ref host) = file.ingest_host {
            self.ingest_host = host.clone();
        }
        if file.ingest_credentials.is_some() {
            self.ingest_credentials = file.ingest_credentials.clone();
        }
        if file.ingest_host_header.is_some() {
            self.ingest_host_header = file.ingest_host_header.clone();
        }
        if let Some(ref host) = file.storage_host {
            self.storage_host = host.clone();
        }
        if let Some(tick) = file.tick {
            self.tick = tick;
        }
        if let Some(ref uuid) = file.test_uuid {
            self.test_uuid = uuid.clone();
        }
        if let Some(ref s) = file.publish_interval {
            self.publish_interval = duration_field("publish_interval", s)?;
        }
        if let Some(ref s) = file.settle_window {
            self.settle_window = duration_field("settle_window", s)?;
        }
        if let Some(ref s) = file.request_timeout {
            self.request_timeout = duration_field("request_timeout", s)?;
        }
        if let Some(remediate) = file.remediate {
            self.remediate = remediate;
        }
        Ok(())
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.ingest_host.trim().is_empty() {
            return Err(ConfigError::EmptyHost("ingest_host"));
        }
        if self.storage_host.trim().is_empty() {
            return Err(ConfigError::EmptyHost("storage_host"));
        }
        if uuid::Uuid::parse_str(&self.test_uuid).is_err() {
            return Err(ConfigError::InvalidUuid(self.test_uuid.clone()));
        }
        for (field, value) in [
            ("publish_interval", self.publish_interval),
            ("settle_window", self.settle_window),
            ("request_timeout", self.request_timeout),
        ] {
            if value.is_zero() {
                return Err(ConfigError::ZeroDuration { field });
            }
            if value > MAX_DURATION {
                return Err(ConfigError::DurationTooLong {
                    field,
                    max: MAX_DURATION,
                });
            }
        }
        Ok(())
    }
}

/// On-disk TOML layer. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    pub port: Option<u16>,
    pub ingest_host: Option<String>,
    pub ingest_credentials: Option<String>,
    pub ingest_host_header: Option<String>,
    pub storage_host: Option<String>,
    pub tick: Option<bool>,
    pub test_uuid: Option<String>,
    /// Duration strings such as "120s", "2m", "500ms".
    pub publish_interval: Option<String>,
    pub settle_window: Option<String>,
    pub request_timeout: Option<String>,
    pub remediate: Option<bool>,
}

impl ConfigFile {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(s)?)
    }
}

fn duration_field(field: &'static str, value: &str) -> ConfigResult<Duration> {
    parse_duration(value).ok_or_else(|| ConfigError::InvalidDuration {
        field,
        value: value.to_string(),
    })
}

/// Parse a duration string like "5s", "500ms", "2m". A bare number is seconds.
pub fn parse_duration(s: &str) -> Option<Duration> {
    let s = s.trim();
    if let Some(secs) = s.strip_suffix('s') {
        if let Some(ms) = secs.strip_suffix('m') {
            ms.parse::<u64>().ok().map(Duration::from_millis)
        } else {
            secs.parse::<u64>().ok().map(Duration::from_secs)
        }
    } else if let Some(mins) = s.strip_suffix('m') {
        mins.parse::<u64>()
            .ok()
            .and_then(|m| m.checked_mul(60))
            .map(Duration::from_secs)
    } else {
        s.parse::<u64>().ok().map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoints() {
        let config = MonitorConfig::default();
        assert_eq!(
            config.ingest_endpoint(),
            "http://cms-notifier-pr-uk-int.svc.ft.com/notify"
        );
        assert_eq!(
            config.storage_endpoint(),
            "http://com.ft.imagepublish.int.s3.amazonaws.com/c94a3a57-3c99-423c-a6bd-ed8c4c10a3c3"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_layer_overrides_defaults() {
        let file = ConfigFile::from_toml_str(
            r#"
ingest_host = "localhost:9000"
tick = false
settle_window = "500ms"
publish_interval = "2m"
"#,
        )
        .unwrap();

        let mut config = MonitorConfig::default();
        config.apply_file(&file).unwrap();
        assert_eq!(config.ingest_host, "localhost:9000");
        assert!(!config.tick);
        assert_eq!(config.settle_window, Duration::from_millis(500));
        assert_eq!(config.publish_interval, Duration::from_secs(120));
        // Untouched values keep their defaults.
        assert_eq!(config.storage_host, DEFAULT_STORAGE_HOST);
    }

    #[test]
    fn file_layer_rejects_bad_duration() {
        let file = ConfigFile {
            request_timeout: Some("soon".to_string()),
            ..Default::default()
        };
        let err = MonitorConfig::default().apply_file(&file).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidDuration { field: "request_timeout", .. }
        ));
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monitor.toml");
        std::fs::write(&path, "storage_host = \"s3.local\"\nremediate = true\n").unwrap();

        let file = ConfigFile::from_file(&path).unwrap();
        assert_eq!(file.storage_host.as_deref(), Some("s3.local"));
        assert_eq!(file.remediate, Some(true));
    }

    #[test]
    fn from_file_missing_is_read_error() {
        let err = ConfigFile::from_file(Path::new("/nonexistent/monitor.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn validate_rejects_invalid_uuid() {
        let config = MonitorConfig {
            test_uuid: "not-a-uuid".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidUuid(_))));
    }

    #[test]
    fn validate_rejects_empty_host_and_zero_interval() {
        let config = MonitorConfig {
            storage_host: " ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyHost("storage_host"))
        ));

        let config = MonitorConfig {
            publish_interval: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration { field: "publish_interval" })
        ));
    }

    #[test]
    fn validate_bounds_settle_window() {
        let config = MonitorConfig {
            settle_window: Duration::ZERO,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration { field: "settle_window" })
        ));

        let config = MonitorConfig {
            settle_window: Duration::from_secs(u64::MAX),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DurationTooLong { field: "settle_window", .. })
        ));

        let config = MonitorConfig {
            publish_interval: MAX_DURATION,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_duration_units() {
        assert_eq!(parse_duration("30s"), Some(Duration::from_secs(30)));
        assert_eq!(parse_duration("500ms"), Some(Duration::from_millis(500)));
        assert_eq!(parse_duration("2m"), Some(Duration::from_secs(120)));
        assert_eq!(parse_duration("10"), Some(Duration::from_secs(10)));
        assert_eq!(parse_duration("later"), None);
        assert_eq!(parse_duration("18446744073709551615m"), None);
    }
}
