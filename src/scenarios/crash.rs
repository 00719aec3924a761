//! Process termination.
//!
//! A deferred worker sleeps for `crash_delay` seconds and then terminates the
//! process through the injected [`Terminator`]. Stopping (or cancelling the
//! parent scope) before the deadline is the only way to avert it.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::lifecycle::{RunState, RunTicket};
use super::{params, Metrics, Params, Result, Scenario, ScenarioStatus};

const NAME: &str = "crash";
const DEFAULT_CRASH_DELAY_SECS: i64 = 10;
const EXIT_CODE: i32 = 1;

/// Capability that ends the process.
pub trait Terminator: Send + Sync + 'static {
    fn terminate(&self, code: i32);
}

/// Production terminator: exits the process immediately.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExit;

impl Terminator for ProcessExit {
    fn terminate(&self, code: i32) {
        std::process::exit(code);
    }
}

#[derive(Default)]
struct CrashState {
    run: RunState,
    crash_delay: i64,
}

/// Simulates a service crash after a delay.
pub struct CrashSimulator {
    state: Arc<RwLock<CrashState>>,
    terminator: Arc<dyn Terminator>,
}

impl CrashSimulator {
    pub fn new(terminator: Arc<dyn Terminator>) -> Self {
        Self {
            state: Arc::new(RwLock::new(CrashState::default())),
            terminator,
        }
    }
}

async fn schedule_crash(
    state: Arc<RwLock<CrashState>>,
    ticket: RunTicket,
    delay: Duration,
    terminator: Arc<dyn Terminator>,
) {
    tokio::select! {
        biased;
        _ = ticket.token.cancelled() => return,
        _ = tokio::time::sleep(delay) => {}
    }

    let mut state = state.write().await;
    // Stop may have won the race for the lock right at the deadline.
    if !state.run.is_current(&ticket) {
        return;
    }

    error!(scenario = NAME, delay_secs = delay.as_secs(), "Terminating process");
    terminator.terminate(EXIT_CODE);
    state.run.finish(&ticket);
}

#[async_trait]
impl Scenario for CrashSimulator {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> &'static str {
        "Simulates service crash after specified delay"
    }

    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()> {
        let mut state = self.state.write().await;

        let crash_delay = params::int(&params, "crash_delay", DEFAULT_CRASH_DELAY_SECS).max(0);
        let ticket = state.run.begin(parent, params);
        state.crash_delay = crash_delay;

        tokio::spawn(schedule_crash(
            Arc::clone(&self.state),
            ticket,
            Duration::from_secs(crash_delay as u64),
            Arc::clone(&self.terminator),
        ));

        info!(scenario = NAME, crash_delay, "Crash scheduled");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.run.halt() {
            info!(scenario = NAME, "Crash averted");
        }
        Ok(())
    }

    async fn status(&self) -> ScenarioStatus {
        let state = self.state.read().await;
        let mut metrics = Metrics::new();
        metrics.insert("crash_delay".to_string(), state.crash_delay as f64);
        state.run.snapshot(metrics)
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
