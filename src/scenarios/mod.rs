//! Fault-injection scenarios.
//!
//! This module contains:
//! - `Scenario` trait: the uniform lifecycle contract (start/stop/status)
//! - `ScenarioStatus`: point-in-time snapshot returned by `status()`
//! - Lenient parameter helpers and per-instance lifecycle state
//! - Implementations: CPU, memory, task leak, latency, health check,
//!   disk IO, crash, dependency failure

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::ScenarioSettings;

pub mod buffer;
pub mod cpu_burner;
pub mod crash;
pub mod dependency;
pub mod disk_io;
pub mod health_check;
pub mod lifecycle;
pub mod memory_leaker;
pub mod network_latency;
pub mod params;
pub mod task_leak;

pub use cpu_burner::CpuBurner;
pub use crash::{CrashSimulator, ProcessExit, Terminator};
pub use dependency::{DependencyFailure, DependencyFault};
pub use disk_io::DiskIo;
pub use health_check::{HealthCheckFailure, HealthVerdict};
pub use memory_leaker::MemoryLeaker;
pub use network_latency::NetworkLatency;
pub use task_leak::TaskLeak;

// ============================================================================
// Types
// ============================================================================

/// Parameters supplied to `Scenario::start`, as decoded from JSON.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Numeric metrics reported by a scenario.
pub type Metrics = BTreeMap<String, f64>;

/// Result type for scenario operations.
pub type Result<T> = std::result::Result<T, ScenarioError>;

/// Errors surfaced by scenario lookups and transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario {0} not found")]
    NotFound(String),

    #[error("scenario {name} failed to start: {message}")]
    Start { name: String, message: String },
}

/// Snapshot of a scenario's runtime state.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioStatus {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    pub params: Params,
    pub metrics: Metrics,
}

// ============================================================================
// Traits
// ============================================================================

/// A named, independently runnable failure behavior.
///
/// Transitions on one instance are serialized by that instance's own lock:
/// `start` on a running scenario stops the previous run first, and `stop`
/// on an idle scenario is a no-op.
#[async_trait]
pub trait Scenario: Send + Sync + 'static {
    /// Registry key, constant for the process lifetime.
    fn name(&self) -> &'static str;

    /// Human-readable summary.
    fn describe(&self) -> &'static str;

    /// Start the scenario under a child scope of `parent`.
    ///
    /// Cancelling `parent` cancels this run. Malformed parameters fall back
    /// to defaults and never cause an error.
    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()>;

    /// Signal the current run to stop. Does not wait for workers to exit.
    async fn stop(&self) -> Result<()>;

    /// Snapshot of running flag, start time, params and metrics.
    async fn status(&self) -> ScenarioStatus;

    /// Access to the concrete type, for collaborators that query
    /// variant-specific state (latency, health verdicts, dependency mode).
    fn as_any(&self) -> &(dyn Any + Send + Sync);
}

/// One instance of every built-in scenario.
pub fn builtin(
    settings: &ScenarioSettings,
    terminator: Arc<dyn Terminator>,
) -> Vec<Arc<dyn Scenario>> {
    vec![
        Arc::new(CpuBurner::new()),
        Arc::new(MemoryLeaker::new(settings.tick_interval())),
        Arc::new(NetworkLatency::new()),
        Arc::new(HealthCheckFailure::new()),
        Arc::new(TaskLeak::new(settings.tick_interval())),
        Arc::new(DiskIo::new(settings.tick_interval(), settings.scratch_dir.clone())),
        Arc::new(CrashSimulator::new(terminator)),
        Arc::new(DependencyFailure::new()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_names_are_unique() {
        let scenarios = builtin(&ScenarioSettings::default(), Arc::new(ProcessExit));
        let mut names: Vec<_> = scenarios.iter().map(|s| s.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn test_status_serializes_without_start_time() {
        let json = serde_json::to_value(ScenarioStatus::default()).unwrap();
        assert_eq!(json["running"], false);
        assert!(json.get("start_time").is_none());
        assert!(json["metrics"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_not_found_message() {
        let err = ScenarioError::NotFound("bogus".to_string());
        assert_eq!(err.to_string(), "scenario bogus not found");
    }
}
