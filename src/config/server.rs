//! Server, logging and mock-service configuration types.

use std::time::Duration;

use serde::Deserialize;

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogMode {
    /// Human-readable lines.
    #[default]
    Console,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub mode: LogMode,
    /// Default filter directive when the log env var is unset.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            mode: LogMode::Console,
            level: "info".to_string(),
        }
    }
}

/// Delays used by the mock dependency endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MockServiceConfig {
    /// Delay before answering while emulating a timeout.
    pub timeout_delay_ms: u64,
    /// Delay before answering while emulating a slow dependency.
    pub slow_delay_ms: u64,
}

impl Default for MockServiceConfig {
    fn default() -> Self {
        Self {
            timeout_delay_ms: 30_000,
            slow_delay_ms: 3_000,
        }
    }
}

impl MockServiceConfig {
    pub fn timeout_delay(&self) -> Duration {
        Duration::from_millis(self.timeout_delay_ms)
    }

    pub fn slow_delay(&self) -> Duration {
        Duration::from_millis(self.slow_delay_ms)
    }
}
