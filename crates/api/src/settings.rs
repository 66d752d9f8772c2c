//! Service settings
//!
//! Layered with the `config` crate: an optional TOML file, then environment
//! variables prefixed `DRIVER_GUARD` with `__` between path segments, e.g.
//! `DRIVER_GUARD__MONITOR__EAR_THRESHOLD=0.25`.

use alerting::AlertConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use dms::{DmsConfig, DmsError};
use landmarks::SourceConfig;
use serde::Deserialize;
use thiserror::Error;

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "DRIVER_GUARD_CONFIG";

/// Settings file used when `DRIVER_GUARD_CONFIG` is unset (extension optional)
pub const DEFAULT_CONFIG_FILE: &str = "driver-guard";

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Load(#[from] ConfigError),

    #[error("Invalid monitor settings: {0}")]
    Invalid(#[from] DmsError),
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Bind address
    pub addr: String,
    /// Serve Prometheus metrics at /metrics
    pub metrics: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: "0.0.0.0:8080".to_string(),
            metrics: true,
        }
    }
}

/// Logging settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Filter used when RUST_LOG is unset
    pub level: String,
    /// Emit JSON lines instead of human readable output
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// All service settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LogSettings,
    pub monitor: DmsConfig,
    pub alert: AlertConfig,
    pub source: SourceConfig,
}

impl Settings {
    /// Load from the settings file (if present) and the environment
    pub fn load() -> Result<Self, SettingsError> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::from_builder(Config::builder().add_source(File::with_name(&path).required(false)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, SettingsError> {
        let settings: Settings = builder
            .add_source(
                Environment::with_prefix("DRIVER_GUARD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        settings.monitor.validate()?;
        Ok(settings)
    }
}
