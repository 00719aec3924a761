//! Scenario manager - registry ownership and composite session orchestration.
//!
//! One manager-level `RwLock` guards the registry and the current session.
//! `start_composite` and `stop_all_scenarios` hold the write lock for their
//! whole duration, so replacing a session is atomic end to end. Single
//! scenario operations only take the read lock to resolve the name and then
//! delegate; each scenario's own lock serializes its transitions.

use std::sync::{Arc, Weak};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ScenarioSettings;
use crate::scenarios::{
    self, ProcessExit, Result, Scenario, ScenarioError, ScenarioStatus, Terminator,
};

mod registry;
mod session;

pub use registry::ScenarioRegistry;
pub use session::{
    CompositeResponse, ScenarioConfig, ScenarioDetail, ScenarioInfo, SessionStatus,
};

use session::Session;

struct ManagerState {
    registry: ScenarioRegistry,
    session: Option<Session>,
    next_epoch: u64,
}

impl ManagerState {
    /// Tear down the live session, if any.
    ///
    /// Cancels the shared scope, then stops every member best-effort.
    async fn stop_current_session(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        if let Some(timer) = session.recovery_timer.take() {
            timer.abort();
        }
        session.scope.cancel();

        for name in &session.members {
            let Some(scenario) = self.registry.get(name) else {
                continue;
            };
            if let Err(e) = scenario.stop().await {
                warn!(
                    session_id = %session.id,
                    scenario = %name,
                    error = %e,
                    "Failed to stop session member"
                );
            }
        }

        info!(
            session_id = %session.id,
            members = session.members.len(),
            elapsed_secs = (Utc::now() - session.started_at).num_seconds(),
            "Session stopped"
        );
    }
}

/// Owns the scenario registry and the single live composite session.
pub struct ScenarioManager {
    state: Arc<RwLock<ManagerState>>,
    /// Parent of every scenario scope started through this manager.
    root: CancellationToken,
}

impl ScenarioManager {
    /// Manager with every built-in scenario and default settings.
    pub fn new() -> Self {
        Self::with_settings(ScenarioSettings::default())
    }

    /// Manager with every built-in scenario.
    pub fn with_settings(settings: ScenarioSettings) -> Self {
        Self::with_terminator(settings, Arc::new(ProcessExit))
    }

    /// Manager with every built-in scenario and a custom crash terminator.
    pub fn with_terminator(settings: ScenarioSettings, terminator: Arc<dyn Terminator>) -> Self {
        Self::from_scenarios(scenarios::builtin(&settings, terminator))
    }

    /// Manager over an explicit scenario set.
    pub fn from_scenarios(scenarios: Vec<Arc<dyn Scenario>>) -> Self {
        let mut registry = ScenarioRegistry::new();
        for scenario in scenarios {
            registry.register(scenario);
        }

        Self {
            state: Arc::new(RwLock::new(ManagerState {
                registry,
                session: None,
                next_epoch: 0,
            })),
            root: CancellationToken::new(),
        }
    }

    /// Add a scenario. Intended for population before serving.
    pub async fn register(&self, scenario: Arc<dyn Scenario>) {
        self.state.write().await.registry.register(scenario);
    }

    /// Look up a scenario by name.
    pub async fn get_scenario(&self, name: &str) -> Option<Arc<dyn Scenario>> {
        self.state.read().await.registry.get(name)
    }

    async fn resolve(&self, name: &str) -> Result<Arc<dyn Scenario>> {
        self.get_scenario(name)
            .await
            .ok_or_else(|| ScenarioError::NotFound(name.to_string()))
    }

    // ========================================================================
    // Single scenario operations
    // ========================================================================

    /// Start one scenario outside of any session.
    pub async fn start(&self, name: &str, params: scenarios::Params) -> Result<()> {
        self.resolve(name).await?.start(&self.root, params).await
    }

    /// Stop one scenario.
    pub async fn stop(&self, name: &str) -> Result<()> {
        self.resolve(name).await?.stop().await
    }

    /// Status of one scenario.
    pub async fn status(&self, name: &str) -> Result<ScenarioStatus> {
        Ok(self.resolve(name).await?.status().await)
    }

    /// Name, description and running flag of every registered scenario.
    pub async fn list(&self) -> Vec<ScenarioInfo> {
        let state = self.state.read().await;
        let mut list = Vec::with_capacity(state.registry.len());
        for scenario in state.registry.iter() {
            list.push(ScenarioInfo {
                name: scenario.name().to_string(),
                description: scenario.describe().to_string(),
                running: scenario.status().await.running,
            });
        }
        list.sort_by(|a, b| a.name.cmp(&b.name));
        list
    }

    // ========================================================================
    // Composite sessions
    // ========================================================================

    /// Replace the current session with a new one built from `configs`.
    ///
    /// Every config is attempted exactly once, in order. Unknown names and
    /// start failures are recorded in the details and never abort the batch.
    /// When any resolved config carries a positive duration, a recovery timer
    /// stops the whole session after the longest one.
    pub async fn start_composite(&self, configs: Vec<ScenarioConfig>) -> CompositeResponse {
        let mut state = self.state.write().await;
        state.stop_current_session().await;

        state.next_epoch += 1;
        let mut session = Session::new(state.next_epoch, self.root.child_token());
        let mut details = Vec::with_capacity(configs.len());
        let mut max_duration: i64 = 0;

        for config in configs {
            let Some(scenario) = state.registry.get(&config.name) else {
                let error = ScenarioError::NotFound(config.name.clone());
                warn!(session_id = %session.id, error = %error, "Skipping unknown scenario");
                details.push(ScenarioDetail::failed(config.name, error));
                continue;
            };

            max_duration = max_duration.max(config.duration.unwrap_or(0));

            match scenario.start(&session.scope, config.params).await {
                Ok(()) => {
                    session.members.push(config.name.clone());
                    details.push(ScenarioDetail::ok(config.name));
                }
                Err(e) => {
                    warn!(
                        session_id = %session.id,
                        scenario = %config.name,
                        error = %e,
                        "Session member failed to start"
                    );
                    details.push(ScenarioDetail::failed(config.name, e));
                }
            }
        }

        let failed = details.iter().filter(|d| !d.success).count();
        let status = SessionStatus::aggregate(session.members.len(), failed);

        if max_duration > 0 {
            session.recovery_timer = Some(tokio::spawn(recovery_timer(
                Arc::downgrade(&self.state),
                session.epoch,
                Duration::from_secs(max_duration as u64),
            )));
        }

        info!(
            session_id = %session.id,
            members = ?session.members,
            status = ?status,
            recovery_secs = max_duration,
            "Composite session started"
        );

        let response = CompositeResponse {
            session_id: Some(session.id.clone()),
            scenarios: session.members.clone(),
            status,
            details,
        };
        state.session = Some(session);
        response
    }

    /// Stop every member of the current session and clear it.
    ///
    /// A no-op when no session is live.
    pub async fn stop_all_scenarios(&self) {
        self.state.write().await.stop_current_session().await;
    }

    /// The live session with each member's current running flag, or the
    /// `no active session` sentinel.
    pub async fn current_session(&self) -> CompositeResponse {
        let state = self.state.read().await;
        let Some(session) = state.session.as_ref() else {
            return CompositeResponse::no_active_session();
        };

        let mut details = Vec::with_capacity(session.members.len());
        for name in &session.members {
            if let Some(scenario) = state.registry.get(name) {
                details.push(ScenarioDetail {
                    name: name.clone(),
                    success: scenario.status().await.running,
                    error: None,
                });
            }
        }

        CompositeResponse {
            session_id: Some(session.id.clone()),
            scenarios: session.members.clone(),
            status: SessionStatus::Running,
            details,
        }
    }

    /// Stop the session and every registered scenario, then cancel the root
    /// scope so nothing started through this manager keeps running.
    pub async fn shutdown(&self) {
        let mut state = self.state.write().await;
        state.stop_current_session().await;
        for scenario in state.registry.iter() {
            if let Err(e) = scenario.stop().await {
                warn!(scenario = scenario.name(), error = %e, "Failed to stop scenario");
            }
        }
        self.root.cancel();
        info!("Scenario manager shut down");
    }
}

impl Default for ScenarioManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Force-stop session `epoch` after `after` elapses.
///
/// Does nothing if that session was already replaced or stopped.
async fn recovery_timer(state: Weak<RwLock<ManagerState>>, epoch: u64, after: Duration) {
    tokio::time::sleep(after).await;

    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.write().await;

    let is_current = state.session.as_ref().is_some_and(|s| s.epoch == epoch);
    if !is_current {
        debug!(epoch, "Recovery timer fired after its session ended");
        return;
    }

    if let Some(session) = state.session.as_mut() {
        // Detach our own handle so teardown does not abort this task.
        session.recovery_timer.take();
        info!(session_id = %session.id, "Recovery timer fired, stopping session");
    }
    state.stop_current_session().await;
}

#[cfg(test)]
mod tests;
