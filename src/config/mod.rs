//! Application configuration.
//!
//! Aggregates configuration from all modules into a single Config struct
//! that can be loaded from YAML files or environment variables.

mod scenarios;
mod server;

pub use scenarios::ScenarioSettings;
pub use server::{LogConfig, LogMode, MockServiceConfig, ServerConfig};

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "faultbox.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "FAULTBOX_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "FAULTBOX";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "FAULTBOX_LOG";

use serde::Deserialize;

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service name, used in logs.
    pub name: String,
    /// HTTP listener.
    pub server: ServerConfig,
    /// Logging.
    pub log: LogConfig,
    /// Built-in scenario settings.
    pub scenarios: ScenarioSettings,
    /// Mock dependency endpoint delays.
    pub mock_service: MockServiceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "faultbox".to_string(),
            server: ServerConfig::default(),
            log: LogConfig::default(),
            scenarios: ScenarioSettings::default(),
            mock_service: MockServiceConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `DEFAULT_CONFIG_FILE` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Create config for testing.
    pub fn for_test() -> Self {
        Self::default()
    }
}
