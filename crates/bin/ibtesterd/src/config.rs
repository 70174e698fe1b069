//! Configuration loading — TOML file with environment variable overrides.
//!
//! Reads `/etc/ibutton-tester/config.toml` unless another path is given on
//! the command line. Every field has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use ibtester_adapter_mqtt::MqttConfig;
use ibtester_adapter_w1::W1Config;
use ibtester_app::presence_test::TestSettings;

/// Path used when no `--config` is given.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ibutton-tester/config.toml";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Broker connection and topics.
    pub mqtt: MqttConfig,
    /// One-wire bus location and filters.
    pub w1: W1Config,
    /// Presence test timing.
    pub test: TestConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Presence test timing, in milliseconds.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct TestConfig {
    pub default_timeout_ms: u64,
    pub debounce_ms: u64,
    pub poll_interval_ms: u64,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `path` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if the resulting configuration is invalid.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("IBTESTER_BROKER_HOST") {
            self.mqtt.broker_host = val;
        }
        if let Ok(val) = std::env::var("IBTESTER_BROKER_PORT") {
            if let Ok(port) = val.parse() {
                self.mqtt.broker_port = port;
            }
        }
        if let Ok(val) = std::env::var("IBTESTER_DEVICES_DIR") {
            self.w1.devices_dir = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("IBTESTER_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.mqtt.broker_port == 0 {
            return Err(ConfigError::Validation("broker port must be non-zero".to_string()));
        }
        if self.mqtt.qos > 2 {
            return Err(ConfigError::Validation(format!(
                "qos must be 0, 1 or 2, got {}",
                self.mqtt.qos
            )));
        }
        for (name, topic) in [
            ("topic_cmd", &self.mqtt.topic_cmd),
            ("topic_state", &self.mqtt.topic_state),
        ] {
            if topic.is_empty() {
                return Err(ConfigError::Validation(format!("{name} must not be empty")));
            }
        }
        if self.mqtt.topic_state.contains(['+', '#']) {
            return Err(ConfigError::Validation(
                "topic_state must not contain wildcards".to_string(),
            ));
        }
        if self.test.default_timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "default_timeout_ms must be non-zero".to_string(),
            ));
        }
        if self.test.poll_interval_ms == 0 {
            return Err(ConfigError::Validation(
                "poll_interval_ms must be non-zero".to_string(),
            ));
        }
        if let Some(family) = self.w1.family_filter.iter().find(|f| f.chars().count() != 2) {
            return Err(ConfigError::Validation(format!(
                "family_filter entries are two characters, got {family:?}"
            )));
        }
        Ok(())
    }

    /// Timing for the presence test engine.
    #[must_use]
    pub fn test_settings(&self) -> TestSettings {
        TestSettings {
            default_timeout: Duration::from_millis(self.test.default_timeout_ms),
            debounce: Duration::from_millis(self.test.debounce_ms),
            poll_interval: Duration::from_millis(self.test.poll_interval_ms),
        }
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: 10_000,
            debounce_ms: 100,
            poll_interval_ms: 50,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "ibtester=info".to_string(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// File I/O failure.
    #[error("failed to read config file {}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
