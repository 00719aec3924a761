//! Memory growth.
//!
//! A single worker appends one `leak_rate_mb` buffer per tick until the
//! accumulated size reaches `target_mb`, then marks the scenario idle while
//! keeping what it allocated. Buffers are released on the next stop or start.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::buffer;
use super::lifecycle::{RunState, RunTicket};
use super::{params, Metrics, Params, Result, Scenario, ScenarioStatus};

const NAME: &str = "memory_leaker";
const DEFAULT_TARGET_MB: i64 = 1024;
const DEFAULT_LEAK_RATE_MB: i64 = 10;

#[derive(Default)]
struct MemoryState {
    run: RunState,
    leaked: Vec<Vec<u8>>,
    target_mb: i64,
    leak_rate_mb: i64,
}

impl MemoryState {
    fn current_mb(&self) -> i64 {
        self.leaked.len() as i64 * self.leak_rate_mb
    }
}

/// Leaks memory at a fixed rate until a target is reached.
pub struct MemoryLeaker {
    state: Arc<RwLock<MemoryState>>,
    tick: Duration,
}

impl MemoryLeaker {
    pub fn new(tick: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(MemoryState::default())),
            tick,
        }
    }
}

async fn leak(state: Arc<RwLock<MemoryState>>, ticket: RunTicket, tick: Duration) {
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = ticket.token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let wanted = {
            let state = state.read().await;
            if !state.run.is_current(&ticket) {
                return;
            }
            (state.current_mb() < state.target_mb).then_some(state.leak_rate_mb)
        };

        // Filled off the lock; the write below re-checks the ticket.
        let mut chunk = None;
        if let Some(mb) = wanted {
            match tokio::task::spawn_blocking(move || buffer::filled(mb)).await {
                Ok(Some(filled)) => chunk = Some(filled),
                _ => {
                    let mut state = state.write().await;
                    if state.run.finish(&ticket) {
                        warn!(
                            scenario = NAME,
                            leak_rate_mb = mb,
                            "Chunk allocation failed, scenario idle"
                        );
                    }
                    return;
                }
            }
        }

        let mut state = state.write().await;
        // A restart or stop may have happened while the chunk was filled.
        if !state.run.is_current(&ticket) {
            return;
        }

        if let Some(chunk) = chunk {
            state.leaked.push(chunk);
            debug!(scenario = NAME, current_mb = state.current_mb(), "Leaked chunk");
        }

        if state.current_mb() >= state.target_mb {
            state.run.finish(&ticket);
            info!(
                scenario = NAME,
                current_mb = state.current_mb(),
                "Target reached, scenario idle"
            );
            return;
        }
    }
}

#[async_trait]
impl Scenario for MemoryLeaker {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> &'static str {
        "Continuously leaks memory at specified rate until target is reached"
    }

    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()> {
        let mut state = self.state.write().await;

        let target_mb = params::int(&params, "target_mb", DEFAULT_TARGET_MB);
        let leak_rate_mb = params::int(&params, "leak_rate_mb", DEFAULT_LEAK_RATE_MB)
            .clamp(1, buffer::MAX_BUFFER_MB);

        let ticket = state.run.begin(parent, params);
        state.leaked = Vec::new();
        state.target_mb = target_mb;
        state.leak_rate_mb = leak_rate_mb;

        tokio::spawn(leak(Arc::clone(&self.state), ticket, self.tick));

        info!(scenario = NAME, target_mb, leak_rate_mb, "Scenario started");
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        let mut state = self.state.write().await;
        let was_running = state.run.halt();
        state.leaked = Vec::new();
        if was_running {
            info!(scenario = NAME, "Scenario stopped, memory released");
        }
        Ok(())
    }

    async fn status(&self) -> ScenarioStatus {
        let state = self.state.read().await;
        let mut metrics = Metrics::new();
        metrics.insert("current_mb".to_string(), state.current_mb() as f64);
        metrics.insert("target_mb".to_string(), state.target_mb as f64);
        metrics.insert("leak_rate_mb".to_string(), state.leak_rate_mb as f64);
        state.run.snapshot(metrics)
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
