//! Scenario runtime settings.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Settings shared by the built-in scenarios.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScenarioSettings {
    /// Tick period of the memory, task-leak and disk workers.
    pub tick_interval_ms: u64,
    /// Directory for disk-pressure scratch files.
    pub scratch_dir: PathBuf,
}

impl Default for ScenarioSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1000,
            scratch_dir: std::env::temp_dir(),
        }
    }
}

impl ScenarioSettings {
    /// Tick period; never zero, since a zero-period interval panics.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn with_tick_interval(mut self, tick: Duration) -> Self {
        self.tick_interval_ms = tick.as_millis() as u64;
        self
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ScenarioSettings::default();
        assert_eq!(settings.tick_interval(), Duration::from_secs(1));
        assert_eq!(settings.scratch_dir, std::env::temp_dir());
    }

    #[test]
    fn test_zero_tick_is_clamped() {
        let settings = ScenarioSettings::default().with_tick_interval(Duration::ZERO);
        assert_eq!(settings.tick_interval(), Duration::from_millis(1));
    }
}
