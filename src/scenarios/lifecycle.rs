//! Per-instance run state shared by every scenario.
//!
//! Each `start` replaces the cancellation scope with a fresh child of the
//! caller's token, so workers from a previous run can never observe a later
//! run's scope. Workers carry a [`RunTicket`] identifying the run they belong
//! to; a ticket from an older run cannot finish a newer one.

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use super::{Metrics, Params, ScenarioStatus};

/// Handle given to the workers of one run.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub token: CancellationToken,
    pub generation: u64,
}

/// Running flag, start time, last params and the current cancellation scope.
///
/// Owned by a scenario and only mutated under that scenario's lock.
#[derive(Debug, Default)]
pub struct RunState {
    running: bool,
    started_at: Option<DateTime<Utc>>,
    params: Params,
    scope: Option<CancellationToken>,
    generation: u64,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new run, halting any previous one first.
    pub fn begin(&mut self, parent: &CancellationToken, params: Params) -> RunTicket {
        self.halt();

        let token = parent.child_token();
        self.generation += 1;
        self.running = true;
        self.started_at = Some(Utc::now());
        self.params = params;
        self.scope = Some(token.clone());

        RunTicket {
            token,
            generation: self.generation,
        }
    }

    /// Cancel the current scope. Returns whether a run was live.
    pub fn halt(&mut self) -> bool {
        let was_running = self.is_running();
        if let Some(scope) = self.scope.take() {
            scope.cancel();
        }
        self.running = false;
        was_running
    }

    /// Halt only if `ticket` belongs to the current run.
    ///
    /// Used by bounded workers that reach completion on their own.
    pub fn finish(&mut self, ticket: &RunTicket) -> bool {
        if self.is_current(ticket) {
            self.halt();
            true
        } else {
            false
        }
    }

    /// Whether `ticket` is the live run's ticket.
    pub fn is_current(&self, ticket: &RunTicket) -> bool {
        self.running && self.generation == ticket.generation && !ticket.token.is_cancelled()
    }

    /// True while started and neither stopped nor cancelled from above.
    pub fn is_running(&self) -> bool {
        self.running
            && self
                .scope
                .as_ref()
                .is_some_and(|scope| !scope.is_cancelled())
    }

    pub fn snapshot(&self, metrics: Metrics) -> ScenarioStatus {
        ScenarioStatus {
            running: self.is_running(),
            start_time: self.started_at,
            params: self.params.clone(),
            metrics,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_marks_running() {
        let parent = CancellationToken::new();
        let mut state = RunState::new();
        let ticket = state.begin(&parent, Params::new());

        assert!(state.is_running());
        assert!(state.is_current(&ticket));
        assert!(state.snapshot(Metrics::new()).start_time.is_some());
    }

    #[test]
    fn test_restart_cancels_previous_scope() {
        let parent = CancellationToken::new();
        let mut state = RunState::new();
        let first = state.begin(&parent, Params::new());
        let second = state.begin(&parent, Params::new());

        assert!(first.token.is_cancelled());
        assert!(!second.token.is_cancelled());
        assert!(!state.is_current(&first));
        assert!(state.is_current(&second));
    }

    #[test]
    fn test_stale_ticket_cannot_finish_new_run() {
        let parent = CancellationToken::new();
        let mut state = RunState::new();
        let stale = state.begin(&parent, Params::new());
        let _live = state.begin(&parent, Params::new());

        assert!(!state.finish(&stale));
        assert!(state.is_running());
    }

    #[test]
    fn test_parent_cancel_reads_as_stopped() {
        let parent = CancellationToken::new();
        let mut state = RunState::new();
        let ticket = state.begin(&parent, Params::new());

        parent.cancel();

        assert!(ticket.token.is_cancelled());
        assert!(!state.is_running());
        assert!(!state.snapshot(Metrics::new()).running);
    }

    #[test]
    fn test_halt_is_idempotent() {
        let parent = CancellationToken::new();
        let mut state = RunState::new();
        state.begin(&parent, Params::new());

        assert!(state.halt());
        assert!(!state.halt());
        assert!(!state.is_running());
    }
}
