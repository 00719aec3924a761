//! Latency injection.
//!
//! Purely stateful: the serving layer asks for the current delay before
//! forwarding each request.

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::lifecycle::RunState;
use super::{params, Metrics, Params, Result, Scenario, ScenarioStatus};

const NAME: &str = "network_latency";
const DEFAULT_LATENCY_MS: i64 = 100;

#[derive(Default)]
struct LatencyState {
    run: RunState,
    latency_ms: i64,
}

/// Adds a fixed delay to every request while running.
pub struct NetworkLatency {
    state: RwLock<LatencyState>,
}

impl NetworkLatency {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(LatencyState::default()),
        }
    }

    /// Delay to inject before serving a request; zero when idle.
    pub async fn latency(&self) -> Duration {
        let state = self.state.read().await;
        if !state.run.is_running() {
            return Duration::ZERO;
        }
        Duration::from_millis(state.latency_ms as u64)
    }
}

impl Default for NetworkLatency {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Scenario for NetworkLatency {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> &'static str {
        "Adds specified latency to HTTP requests"
    }

    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()> {
        let mut state = self.state.write().await;
        let latency_ms = params::int(&params, "latency_ms", DEFAULT_LATENCY_MS).max(0);
        state.run.begin(parent, params);
        state.latency_ms = latency_ms;
        info!(scenario = NAME, latency_ms, "Scenario started");
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
        let state = self.state.read().await;
        let mut metrics = Metrics::new();
        metrics.insert("latency_ms".to_string(), state.latency_ms as f64);
        state.run.snapshot(metrics)
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_latency_only_while_running() {
        let latency = NetworkLatency::new();
        let parent = CancellationToken::new();
        assert_eq!(latency.latency().await, Duration::ZERO);

        let params = json!({"latency_ms": 250.0}).as_object().cloned().unwrap();
        latency.start(&parent, params).await.unwrap();
        assert_eq!(latency.latency().await, Duration::from_millis(250));

        latency.stop().await.unwrap();
        assert_eq!(latency.latency().await, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_default_latency() {
        let latency = NetworkLatency::new();
        let parent = CancellationToken::new();

        latency.start(&parent, Params::new()).await.unwrap();
        let status = latency.status().await;

        assert!(status.running);
        assert_eq!(status.metrics["latency_ms"], 100.0);
        assert_eq!(latency.latency().await, Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_parent_cancel_clears_latency() {
        let latency = NetworkLatency::new();
        let parent = CancellationToken::new();

        latency.start(&parent, Params::new()).await.unwrap();
        parent.cancel();

        assert_eq!(latency.latency().await, Duration::ZERO);
        assert!(!latency.status().await.running);
    }
}
