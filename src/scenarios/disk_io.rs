//! Disk pressure.
//!
//! Each tick writes a `write_rate_mb` buffer to a fresh scratch file, syncs
//! it and deletes it. Write failures are counted and retried on the next
//! tick; they are never surfaced to callers.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::buffer;
use super::lifecycle::{RunState, RunTicket};
use super::{params, Metrics, Params, Result, Scenario, ScenarioStatus};

const NAME: &str = "disk_io";
const DEFAULT_WRITE_RATE_MB: i64 = 50;
const FILE_PREFIX: &str = "faultbox-io-test";

/// Counters for one run.
#[derive(Debug, Default)]
struct IoCounters {
    files_written: AtomicU64,
    write_errors: AtomicU64,
}

#[derive(Default)]
struct DiskState {
    run: RunState,
    write_rate_mb: i64,
    counters: Arc<IoCounters>,
}

/// Generates sustained disk writes.
pub struct DiskIo {
    state: Arc<RwLock<DiskState>>,
    tick: Duration,
    scratch_dir: PathBuf,
}

impl DiskIo {
    pub fn new(tick: Duration, scratch_dir: PathBuf) -> Self {
        Self {
            state: Arc::new(RwLock::new(DiskState::default())),
            tick,
            scratch_dir,
        }
    }
}

async fn write_once(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::remove_file(path).await
}

async fn perform_io(
    state: Arc<RwLock<DiskState>>,
    ticket: RunTicket,
    write_rate_mb: i64,
    tick: Duration,
    scratch_dir: PathBuf,
    counters: Arc<IoCounters>,
) {
    let mut data: Option<Vec<u8>> = None;
    let mut ticker = interval_at(Instant::now() + tick, tick);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut counter: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = ticket.token.cancelled() => return,
            _ = ticker.tick() => {}
        }

        if data.is_none() {
            match tokio::task::spawn_blocking(move || buffer::filled(write_rate_mb)).await {
                Ok(Some(filled)) => data = Some(filled),
                _ => {
                    if state.write().await.run.finish(&ticket) {
                        warn!(
                            scenario = NAME,
                            write_rate_mb,
                            "Write buffer allocation failed, scenario idle"
                        );
                    }
                    return;
                }
            }
        }
        let Some(data) = data.as_deref() else {
            return;
        };
        let path = scratch_dir.join(format!("{}-{}", FILE_PREFIX, counter));
        match write_once(&path, data).await {
            Ok(()) => {
                counter += 1;
                counters.files_written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                counters.write_errors.fetch_add(1, Ordering::Relaxed);
                debug!(
                    scenario = NAME,
                    path = %path.display(),
                    error = %e,
                    "Scratch write failed, retrying next tick"
                );
                let _ = tokio::fs::remove_file(&path).await;
            }
        }
    }
}

#[async_trait]
impl Scenario for DiskIo {
    fn name(&self) -> &'static str {
        NAME
    }

    fn describe(&self) -> &'static str {
        "Generates high disk IO by writing data at specified rate"
    }

    async fn start(&self, parent: &CancellationToken, params: Params) -> Result<()> {
        let mut state = self.state.write().await;

        let write_rate_mb = params::int(&params, "write_rate_mb", DEFAULT_WRITE_RATE_MB)
            .clamp(1, buffer::MAX_BUFFER_MB);
        let ticket = state.run.begin(parent, params);
        let counters = Arc::new(IoCounters::default());
        state.write_rate_mb = write_rate_mb;
        state.counters = Arc::clone(&counters);

        tokio::spawn(perform_io(
            Arc::clone(&self.state),
            ticket,
            write_rate_mb,
            self.tick,
            self.scratch_dir.clone(),
            counters,
        ));

        info!(
            scenario = NAME,
            write_rate_mb,
            scratch_dir = %self.scratch_dir.display(),
            "Scenario started"
        );
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
        metrics.insert("write_rate_mb".to_string(), state.write_rate_mb as f64);
        metrics.insert(
            "files_written".to_string(),
            state.counters.files_written.load(Ordering::Relaxed) as f64,
        );
        metrics.insert(
            "write_errors".to_string(),
            state.counters.write_errors.load(Ordering::Relaxed) as f64,
        );
        state.run.snapshot(metrics)
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
