//! Configuration management for the courier dispatcher
//!
//! Configuration is layered: built-in defaults, then an optional TOML file,
//! then environment variables. Command-line flags are applied last by the
//! binary.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::dispatch::{ClientConfig, DEFAULT_ENDPOINT};
use crate::scheduler::{SchedulerConfig, DEFAULT_BATCH_SIZE, DEFAULT_INTERVAL};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Round scheduling and endpoint settings
    pub dispatch: DispatchConfig,

    /// Input data locations
    pub data: DataConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Dispatch-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Milliseconds between round starts
    pub interval_ms: u64,

    /// Candidates offered per shipment per round
    pub batch_size: usize,

    /// Base URL of the driver endpoint
    pub endpoint: String,

    /// Per-offer request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_INTERVAL.as_millis() as u64,
            batch_size: DEFAULT_BATCH_SIZE,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_secs: 10,
        }
    }
}

/// Input data configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Shipments JSON file
    pub shipments_path: PathBuf,

    /// Drivers JSON file
    pub drivers_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            shipments_path: PathBuf::from("data/shipments.json"),
            drivers_path: PathBuf::from("data/drivers.json"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// An environment override that was set but could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredEnvValue {
    pub key: String,
    pub value: String,
}

impl fmt::Display for IgnoredEnvValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?}", self.key, self.value)
    }
}

/// First parseable value among the given environment variables
fn env_value<T: FromStr>(keys: &[&str], ignored: &mut Vec<IgnoredEnvValue>) -> Option<T> {
    for key in keys {
        if let Ok(raw) = std::env::var(key) {
            match raw.trim().parse::<T>() {
                Ok(value) => return Some(value),
                Err(_) => ignored.push(IgnoredEnvValue {
                    key: (*key).to_string(),
                    value: raw,
                }),
            }
        }
    }
    None
}

impl Config {
    /// Defaults overridden by environment variables
    pub fn from_env() -> Self {
        let mut config = Self::default();
        for ignored in config.apply_env_overrides() {
            tracing::warn!(key = %ignored.key, value = %ignored.value, "Ignoring unparseable environment value");
        }
        config
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// `DISPATCH_FREQUENCY` and `NUM_DRIVERS` are accepted as fallbacks for
    /// the `COURIER_` prefixed names. Values that fail to parse leave the
    /// setting unchanged and are returned so the caller can report them once
    /// logging is up.
    pub fn apply_env_overrides(&mut self) -> Vec<IgnoredEnvValue> {
        let mut ignored = Vec::new();

        if let Some(v) = env_value(&["COURIER_DISPATCH_FREQUENCY", "DISPATCH_FREQUENCY"], &mut ignored) {
            self.dispatch.interval_ms = v;
        }
        if let Some(v) = env_value(&["COURIER_NUM_DRIVERS", "NUM_DRIVERS"], &mut ignored) {
            self.dispatch.batch_size = v;
        }
        if let Some(v) = env_value(&["COURIER_ENDPOINT"], &mut ignored) {
            self.dispatch.endpoint = v;
        }
        if let Some(v) = env_value(&["COURIER_REQUEST_TIMEOUT"], &mut ignored) {
            self.dispatch.request_timeout_secs = v;
        }
        if let Some(v) = env_value(&["COURIER_SHIPMENTS_PATH"], &mut ignored) {
            self.data.shipments_path = v;
        }
        if let Some(v) = env_value(&["COURIER_DRIVERS_PATH"], &mut ignored) {
            self.data.drivers_path = v;
        }
        if let Some(v) = env_value(&["COURIER_LOG_LEVEL"], &mut ignored) {
            self.logging.level = v;
        }
        if let Some(v) = env_value(&["COURIER_LOG_FORMAT"], &mut ignored) {
            self.logging.format = v;
        }
        ignored
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.batch_size == 0 {
            anyhow::bail!("batch_size must be greater than 0");
        }

        if self.dispatch.interval_ms == 0 {
            anyhow::bail!("interval_ms must be greater than 0");
        }

        if self.dispatch.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        self.client_config()
            .parsed_base_url()
            .context("endpoint is not a usable URL")?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json', got '{}'", self.logging.format);
        }

        Ok(())
    }

    /// Get round interval as Duration
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.dispatch.interval_ms)
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.dispatch.request_timeout_secs)
    }

    /// Scheduler tunables
    #[must_use]
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::new(self.dispatch.batch_size, self.interval())
    }

    /// HTTP dispatch client settings
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new(self.dispatch.endpoint.clone()).with_timeout(self.request_timeout())
    }
}
