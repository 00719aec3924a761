//! Test utilities.
//!
//! Test doubles for capabilities that must never run for real under test.

use std::any::Any;
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::scenarios::{Params, Result, Scenario, ScenarioError, ScenarioStatus, Terminator};

/// Terminator that records calls instead of exiting.
#[derive(Debug, Default)]
pub struct RecordingTerminator {
    calls: AtomicU32,
    last_code: AtomicI32,
}

impl RecordingTerminator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_code(&self) -> Option<i32> {
        (self.calls() > 0).then(|| self.last_code.load(Ordering::SeqCst))
    }
}

impl Terminator for RecordingTerminator {
    fn terminate(&self, code: i32) {
        self.last_code.store(code, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Scenario whose `start` always fails. Counts stop calls.
#[derive(Debug, Default)]
pub struct FailingScenario {
    stops: AtomicU32,
}

impl FailingScenario {
    pub const NAME: &'static str = "always_fails";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn stops(&self) -> u32 {
        self.stops.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scenario for FailingScenario {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn describe(&self) -> &'static str {
        "Refuses to start"
    }

    async fn start(&self, _parent: &CancellationToken, _params: Params) -> Result<()> {
        Err(ScenarioError::Start {
            name: Self::NAME.to_string(),
            message: "refused".to_string(),
        })
    }

    async fn stop(&self) -> Result<()> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn status(&self) -> ScenarioStatus {
        ScenarioStatus::default()
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
