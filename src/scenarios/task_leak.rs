//! Unbounded task creation.
//!
//! A ticking worker spawns `goroutines_per_second` tasks per tick, each of
//! which waits forever. Stopping halts the ticker only: tasks already spawned
//! are never reclaimed, which is the leak being simulated.

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::lifecycle::{RunState, RunTicket};
use super::{params, Metrics, Params, Result, Scenario, ScenarioStatus};

const NAME: &str = "goroutine_leak";
const DEFAULT_LEAK_RATE: i64 = 100;

#[derive(Default)]
struct LeakState {
    run: RunState,
    leak_rate: i64,
}

/// Spawns never-ending tasks at a fixed rate.
pub struct TaskLeak {
    state: RwLock<LeakState>,
    /// Lifetime count of leaked tasks; survives stop and restart.
    leaked: Arc<AtomicU64>,
    tick: Duration,
}

impl TaskLeak {
    pub fn new(tick: Duration) -> Self {
        Self {
            state: RwLock::new(LeakState::default()),
            leaked: Arc::new(AtomicU64::new(0)),
            tick,
        }
    }

    /// Number of tasks leaked so far by this instance.
    pub fn leaked_tasks(&self) -> u64 {
        self.leaked.load(Ordering::Relaxed)
    }
}

async fn spawn_leaks(ticket: RunTicket, leak_rate: i64, tick: Duration, leaked: Arc<AtomicU64>) {
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = ticket.token.cancelled() => return,
            _ = ticker.tick() => {
                for _ in 0..leak_rate {
                    tokio::spawn(std::future::pending::<()>());
                }
                let total =
                    leaked.fetch_add(leak_rate as u64, Ordering::Relaxed) + leak_rate as u64;
                debug!(scenario = NAME, total, "Leaked task batch");
            }
        }
    }
}

#[async_trait]
impl Scenario for TaskLeak {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> &'static str {
        "Creates tasks that never exit, causing a task leak"
    }

    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()> {
        let mut state = self.state.write().await;

        let leak_rate = params::int(&params, "goroutines_per_second", DEFAULT_LEAK_RATE).max(0);
        let ticket = state.run.begin(parent, params);
        state.leak_rate = leak_rate;

        tokio::spawn(spawn_leaks(ticket, leak_rate, self.tick, Arc::clone(&self.leaked)));

        info!(scenario = NAME, leak_rate, "Scenario started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.run.halt() {
            info!(
                scenario = NAME,
                leaked = self.leaked_tasks(),
                "Scenario stopped, leaked tasks remain"
            );
        }
        Ok(())
    }

    async fn status(&self) -> ScenarioStatus {
        let state = self.state.read().await;
        let mut metrics = Metrics::new();
        metrics.insert("leak_rate".to_string(), state.leak_rate as f64);
        metrics.insert("leaked_tasks".to_string(), self.leaked_tasks() as f64);
        state.run.snapshot(metrics)
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
