//! Bootstrap utilities for the faultbox binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogConfig, LogMode, LOG_ENV_VAR};

/// Build the log filter from `LOG_ENV_VAR`, falling back to the configured level.
pub fn env_filter(log: &LogConfig) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(&log.level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing with a console or JSON formatter.
pub fn init_tracing(log: &LogConfig) {
    let registry = tracing_subscriber::registry().with(env_filter(log));

    match log.mode {
        LogMode::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogMode::Console => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_level_falls_back() {
        let log = LogConfig {
            mode: LogMode::Console,
            level: "not a [valid directive".to_string(),
        };
        // Must not panic; the fallback filter is used instead.
        let _ = env_filter(&log);
    }
}
