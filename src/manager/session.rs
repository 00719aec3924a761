//! Composite session types.
//!
//! A session is the set of scenarios started by one composite request. Its
//! members share one cancellation scope and an optional recovery timer.

use chrono::{DateTime, Utc};
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::scenarios::Params;

/// One member of a composite start request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    #[serde(default, deserialize_with = "params_or_empty")]
    pub params: Params,
    /// Seconds until the session is force-stopped; non-positive means none.
    #[serde(default, alias = "duration_seconds")]
    pub duration: Option<i64>,
}

fn params_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Params, D::Error> {
    Ok(Option::<Params>::deserialize(deserializer)?.unwrap_or_default())
}

impl ScenarioConfig {
    pub fn new(name: impl Into<String>, params: Params) -> Self {
        Self {
            name: name.into(),
            params,
            duration: None,
        }
    }

    pub fn with_duration(mut self, seconds: i64) -> Self {
        self.duration = Some(seconds);
        self
    }
}

/// Aggregate outcome of a composite start, or the state of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    #[serde(rename = "success")]
    Success,
    #[serde(rename = "partial")]
    Partial,
    #[serde(rename = "failed")]
    Failed,
    #[serde(rename = "running")]
    Running,
    #[serde(rename = "no active session")]
    NoActiveSession,
}

impl SessionStatus {
    /// Classify a composite start from its member outcomes.
    pub fn aggregate(started: usize, failed: usize) -> Self {
        match (started, failed) {
            (0, _) => Self::Failed,
            (_, 0) => Self::Success,
            _ => Self::Partial,
        }
    }
}

/// Per-member outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioDetail {
    pub name: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScenarioDetail {
    pub fn ok(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            success: true,
            error: None,
        }
    }

    pub fn failed(name: impl Into<String>, error: impl ToString) -> Self {
        Self {
            name: name.into(),
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Result of `start_composite` and `current_session`.
///
/// A real session always serializes every field, empty lists included.
/// Only the no-active-session response collapses to `{"status": ...}`.
#[derive(Debug, Clone)]
pub struct CompositeResponse {
    pub session_id: Option<String>,
    pub scenarios: Vec<String>,
    pub status: SessionStatus,
    pub details: Vec<ScenarioDetail>,
}

impl Serialize for CompositeResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let Some(session_id) = &self.session_id else {
            let mut out = serializer.serialize_struct("CompositeResponse", 1)?;
            out.serialize_field("status", &self.status)?;
            return out.end();
        };

        let mut out = serializer.serialize_struct("CompositeResponse", 4)?;
        out.serialize_field("session_id", session_id)?;
        out.serialize_field("scenarios", &self.scenarios)?;
        out.serialize_field("status", &self.status)?;
        out.serialize_field("details", &self.details)?;
        out.end()
    }
}

impl CompositeResponse {
    /// Sentinel returned when no session is live.
    pub fn no_active_session() -> Self {
        Self {
            session_id: None,
            scenarios: Vec::new(),
            status: SessionStatus::NoActiveSession,
            details: Vec::new(),
        }
    }
}

/// Listing entry for one registered scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub description: String,
    pub running: bool,
}

/// The live composite session.
pub(crate) struct Session {
    pub id: String,
    /// Identifies this session to its recovery timer.
    pub epoch: u64,
    /// Successfully started members, in config order.
    pub members: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub scope: CancellationToken,
    pub recovery_timer: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(epoch: u64, scope: CancellationToken) -> Self {
        let started_at = Utc::now();
        Self {
            id: format!("session-{}", started_at.timestamp()),
            epoch,
            members: Vec::new(),
            started_at,
            scope,
            recovery_timer: None,
        }
    }
}
