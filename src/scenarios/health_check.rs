//! Health-check poisoning.
//!
//! Purely stateful. The health endpoint asks [`HealthCheckFailure::should_fail`]
//! for a verdict on every probe.
//!
//! Modes:
//! - `always`: fail with the configured status code
//! - `intermittent`: fail with 503 when a uniform draw falls below `fail_rate`
//! - `delayed`: succeed after `delay_ms`
//! - anything else: succeed immediately

use std::any::Any;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::lifecycle::RunState;
use super::{params, Metrics, Params, Result, Scenario, ScenarioStatus};

const NAME: &str = "health_check";
const DEFAULT_MODE: &str = "always";
const DEFAULT_STATUS_CODE: i64 = 503;
const DEFAULT_FAIL_RATE: f64 = 0.5;
const DEFAULT_DELAY_MS: i64 = 10_000;
const INTERMITTENT_STATUS_CODE: u16 = 503;
const HEALTHY_STATUS_CODE: u16 = 200;

/// Outcome of a single health probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthVerdict {
    pub fail: bool,
    pub status_code: u16,
    pub delay: Duration,
}

impl HealthVerdict {
    pub fn healthy() -> Self {
        Self {
            fail: false,
            status_code: HEALTHY_STATUS_CODE,
            delay: Duration::ZERO,
        }
    }

    fn failing(status_code: u16) -> Self {
        Self {
            fail: true,
            status_code,
            delay: Duration::ZERO,
        }
    }
}

struct HealthState {
    run: RunState,
    failure_mode: String,
    status_code: u16,
    fail_rate: f64,
    delay: Duration,
}

impl Default for HealthState {
    fn default() -> Self {
        Self {
            run: RunState::new(),
            failure_mode: DEFAULT_MODE.to_string(),
            status_code: DEFAULT_STATUS_CODE as u16,
            fail_rate: DEFAULT_FAIL_RATE,
            delay: Duration::from_millis(DEFAULT_DELAY_MS as u64),
        }
    }
}

/// Makes the health endpoint report failures.
pub struct HealthCheckFailure {
    state: RwLock<HealthState>,
}

impl HealthCheckFailure {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(HealthState::default()),
        }
    }

    /// Verdict for one health probe.
    pub async fn should_fail(&self) -> HealthVerdict {
        let state = self.state.read().await;
        if !state.run.is_running() {
            return HealthVerdict::healthy();
        }

        match state.failure_mode.as_str() {
            "always" => HealthVerdict::failing(state.status_code),
            "intermittent" => {
                if rand::rng().random::<f64>() < state.fail_rate {
                    HealthVerdict::failing(INTERMITTENT_STATUS_CODE)
                } else {
                    HealthVerdict::healthy()
                }
            }
            "delayed" => HealthVerdict {
                delay: state.delay,
                ..HealthVerdict::healthy()
            },
            _ => HealthVerdict::healthy(),
        }
    }
}

impl Default for HealthCheckFailure {
    fn default() -> Self {
        Self::new()
    }
}

/// Out-of-range codes would be rejected by the HTTP layer; keep the default.
fn parse_status_code(params: &Params) -> u16 {
    u16::try_from(params::int(params, "status_code", DEFAULT_STATUS_CODE))
        .ok()
        .filter(|code| (100..=599).contains(code))
        .unwrap_or(DEFAULT_STATUS_CODE as u16)
}

#[async_trait]
impl Scenario for HealthCheckFailure {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> &'static str {
        "Controls health check endpoint to return failures"
    }

    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()> {
        let mut state = self.state.write().await;

        let failure_mode = params::string(&params, "failure_mode", DEFAULT_MODE);
        let status_code = parse_status_code(&params);
        let fail_rate = params::float(&params, "fail_rate", DEFAULT_FAIL_RATE).clamp(0.0, 1.0);
        let delay_ms = params::int(&params, "delay_ms", DEFAULT_DELAY_MS).max(0);

        state.run.begin(parent, params);
        info!(
            scenario = NAME,
            failure_mode = %failure_mode,
            status_code,
            fail_rate,
            "Scenario started"
        );
        state.failure_mode = failure_mode;
        state.status_code = status_code;
        state.fail_rate = fail_rate;
        state.delay = Duration::from_millis(delay_ms as u64);
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
        metrics.insert("status_code".to_string(), state.status_code as f64);
        metrics.insert("fail_rate".to_string(), state.fail_rate);
        state.run.snapshot(metrics)
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
