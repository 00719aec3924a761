//! Dependency-failure emulation.
//!
//! Purely stateful. A dependency-facing endpoint asks for the active fault
//! and emulates a timeout, an error, a slow response or pass-through.

use std::any::Any;
use std::fmt;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::lifecycle::RunState;
use super::{params, Metrics, Params, Result, Scenario, ScenarioStatus};

const NAME: &str = "dependency";
const DEFAULT_FAILURE_TYPE: &str = "timeout";

/// Kind of dependency failure to emulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyFault {
    Timeout,
    Error,
    Slow,
    /// Unrecognized mode; callers pass through.
    Other(String),
}

impl DependencyFault {
    pub fn parse(s: &str) -> Self {
        match s {
            "timeout" => Self::Timeout,
            "error" => Self::Error,
            "slow" => Self::Slow,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DependencyFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::Error => write!(f, "error"),
            Self::Slow => write!(f, "slow"),
            Self::Other(s) => write!(f, "{}", s),
        }
    }
}

struct DependencyState {
    run: RunState,
    failure: DependencyFault,
}

/// Simulates failures of a downstream service.
pub struct DependencyFailure {
    state: RwLock<DependencyState>,
}

impl DependencyFailure {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DependencyState {
                run: RunState::new(),
                failure: DependencyFault::Timeout,
            }),
        }
    }

    /// The fault to emulate, or `None` while idle.
    pub async fn failure_type(&self) -> Option<DependencyFault> {
        let state = self.state.read().await;
        state.run.is_running().then(|| state.failure.clone())
    }
}

impl Default for DependencyFailure {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scenario for DependencyFailure {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> &'static str {
        "Simulates dependency service failures (timeout, error, slow response)"
    }

    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()> {
        let mut state = self.state.write().await;
        let failure = DependencyFault::parse(&params::string(
            &params,
            "failure_type",
            DEFAULT_FAILURE_TYPE,
        ));
        state.run.begin(parent, params);
        info!(scenario = NAME, failure_type = %failure, "Scenario started");
        state.failure = failure;
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.run.halt() {
            info!(scenario = NAME, "Scenario stopped");
        }
        Ok(())
    }

    async fn status(&self) -> ScenarioStatus {
        self.state.read().await.run.snapshot(Metrics::new())
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_modes() {
        assert_eq!(DependencyFault::parse("timeout"), DependencyFault::Timeout);
        assert_eq!(DependencyFault::parse("error"), DependencyFault::Error);
        assert_eq!(DependencyFault::parse("slow"), DependencyFault::Slow);
        assert_eq!(
            DependencyFault::parse("flaky"),
            DependencyFault::Other("flaky".to_string())
        );
    }

    #[tokio::test]
    async fn test_inactive_until_started() {
        let dep = DependencyFailure::new();
        assert_eq!(dep.failure_type().await, None);

        let parent = CancellationToken::new();
        let params = json!({"failure_type": "slow"}).as_object().cloned().unwrap();
        dep.start(&parent, params).await.unwrap();
        assert_eq!(dep.failure_type().await, Some(DependencyFault::Slow));

        dep.stop().await.unwrap();
        assert_eq!(dep.failure_type().await, None);
    }

    #[tokio::test]
    async fn test_mistyped_mode_defaults_to_timeout() {
        let dep = DependencyFailure::new();
        let parent = CancellationToken::new();
        let params = json!({"failure_type": 7}).as_object().cloned().unwrap();

        dep.start(&parent, params).await.unwrap();
        let status = dep.status().await;

        assert!(status.running);
        assert!(status.metrics.is_empty());
        assert_eq!(dep.failure_type().await, Some(DependencyFault::Timeout));
    }
}
