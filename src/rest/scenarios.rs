//! Scenario and composite session handlers.

use axum::extract::{Path, State};
use axum::Json;
use bytes::Bytes;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::manager::{CompositeResponse, ScenarioConfig};
use crate::scenarios::{Params, ScenarioStatus};

/// Body of `POST /api/v1/composite/start`.
#[derive(Debug, Deserialize)]
struct CompositeRequest {
    #[serde(default)]
    scenarios: Vec<ScenarioConfig>,
}

/// Params for a single start. An empty or `null` body means no params.
fn parse_params(body: &Bytes) -> Result<Params, ApiError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Params::new());
    }
    Ok(serde_json::from_slice::<Option<Params>>(body)?.unwrap_or_default())
}

pub(super) async fn list(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "scenarios": state.manager.list().await }))
}

/// Starts the scenario as a one-member composite session.
pub(super) async fn start(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<Json<CompositeResponse>, ApiError> {
    let params = parse_params(&body)?;
    let response = state
        .manager
        .start_composite(vec![ScenarioConfig::new(name, params)])
        .await;
    Ok(Json(response))
}

pub(super) async fn stop(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ScenarioStatus>, ApiError> {
    state.manager.stop(&name).await?;
    Ok(Json(state.manager.status(&name).await?))
}

pub(super) async fn status(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ScenarioStatus>, ApiError> {
    Ok(Json(state.manager.status(&name).await?))
}

pub(super) async fn start_composite(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<CompositeResponse>, ApiError> {
    let request: CompositeRequest = serde_json::from_slice(&body)?;
    Ok(Json(state.manager.start_composite(request.scenarios).await))
}

pub(super) async fn stop_all(State(state): State<AppState>) -> Json<Value> {
    state.manager.stop_all_scenarios().await;
    Json(json!({ "status": "all scenarios stopped" }))
}

pub(super) async fn current_session(State(state): State<AppState>) -> Json<CompositeResponse> {
    Json(state.manager.current_session().await)
}
