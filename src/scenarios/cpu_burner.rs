//! CPU saturation.
//!
//! One dedicated OS thread per logical core spins on a fixed work quantum,
//! then sleeps for `(100 - target_percent) * 10µs`. This is an open-loop
//! approximation; actual utilization is not measured.

use std::any::Any;
use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::lifecycle::RunState;
use super::{params, Metrics, Params, Result, Scenario, ScenarioStatus};

const NAME: &str = "cpu_burner";
const DEFAULT_TARGET_PERCENT: i64 = 50;
const SPIN_ITERATIONS: u64 = 1_000_000;

#[derive(Default)]
struct CpuState {
    run: RunState,
    target_percent: i64,
}

/// Burns CPU on every core until stopped.
pub struct CpuBurner {
    state: RwLock<CpuState>,
}

impl CpuBurner {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(CpuState::default()),
        }
    }
}

impl Default for CpuBurner {
    fn default() -> Self {
        Self::new()
    }
}

fn num_cores() -> usize {
    thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn burn(token: CancellationToken, target_percent: i64) {
    let pause = Duration::from_micros(((100 - target_percent) * 10) as u64);
    while !token.is_cancelled() {
        let mut acc = 0u64;
        for j in 0..SPIN_ITERATIONS {
            acc = acc.wrapping_add(j.wrapping_mul(j));
        }
        std::hint::black_box(acc);
        if !pause.is_zero() {
            thread::sleep(pause);
        }
    }
}

#[async_trait]
impl Scenario for CpuBurner {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> &'static str {
        "Increases CPU usage to specified percentage"
    }

    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()> {
        let mut state = self.state.write().await;

        let target_percent =
            params::int(&params, "target_percent", DEFAULT_TARGET_PERCENT).clamp(0, 100);
        let ticket = state.run.begin(parent, params);
        state.target_percent = target_percent;

        let cores = num_cores();
        for i in 0..cores {
            let token = ticket.token.clone();
            let spawned = thread::Builder::new()
                .name(format!("cpu-burner-{}", i))
                .spawn(move || burn(token, target_percent));
            if let Err(e) = spawned {
                warn!(scenario = NAME, error = %e, "Failed to spawn burner thread");
            }
        }

        info!(scenario = NAME, target_percent, cores, "Scenario started");
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
        metrics.insert("target_percent".to_string(), state.target_percent as f64);
        metrics.insert("num_cores".to_string(), num_cores() as f64);
        state.run.snapshot(metrics)
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
