//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use faultbox::config::ScenarioSettings;
use faultbox::manager::ScenarioManager;
use faultbox::scenarios::{Params, Terminator};

/// Counts termination requests instead of exiting the test binary.
#[derive(Debug, Default)]
pub struct CountingTerminator {
    calls: AtomicU32,
}

impl CountingTerminator {
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Terminator for CountingTerminator {
    fn terminate(&self, _code: i32) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Manager with every built-in scenario, a fast tick and a private scratch dir.
pub fn manager(scratch: &tempfile::TempDir) -> (ScenarioManager, Arc<CountingTerminator>) {
    let terminator = Arc::new(CountingTerminator::default());
    let settings = ScenarioSettings::default()
        .with_tick_interval(Duration::from_millis(20))
        .with_scratch_dir(scratch.path());
    let manager = ScenarioManager::with_terminator(settings, terminator.clone());
    (manager, terminator)
}

pub fn params(value: serde_json::Value) -> Params {
    value.as_object().cloned().unwrap_or_default()
}
