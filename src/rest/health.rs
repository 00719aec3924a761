//! Health probes and the mock downstream service.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde_json::json;
use tracing::debug;

use super::AppState;
use crate::scenarios::{DependencyFailure, DependencyFault, HealthCheckFailure, HealthVerdict};

async fn health_verdict(state: &AppState) -> HealthVerdict {
    let Some(scenario) = state.manager.get_scenario("health_check").await else {
        return HealthVerdict::healthy();
    };
    match scenario.as_any().downcast_ref::<HealthCheckFailure>() {
        Some(health) => health.should_fail().await,
        None => HealthVerdict::healthy(),
    }
}

async fn dependency_fault(state: &AppState) -> Option<DependencyFault> {
    let scenario = state.manager.get_scenario("dependency").await?;
    scenario
        .as_any()
        .downcast_ref::<DependencyFailure>()?
        .failure_type()
        .await
}

fn ok() -> Response {
    Json(json!({ "status": "ok" })).into_response()
}

/// Serves both `/health` and `/ready`.
pub(super) async fn health(State(state): State<AppState>) -> Response {
    let verdict = health_verdict(&state).await;

    if !verdict.delay.is_zero() {
        tokio::time::sleep(verdict.delay).await;
    }

    if verdict.fail {
        let status =
            StatusCode::from_u16(verdict.status_code).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
        debug!(status = status.as_u16(), "Reporting unhealthy");
        return (status, Json(json!({ "status": "unhealthy" }))).into_response();
    }

    (StatusCode::OK, Json(json!({ "status": "healthy" }))).into_response()
}

pub(super) async fn mock_service(State(state): State<AppState>) -> Response {
    match dependency_fault(&state).await {
        Some(DependencyFault::Timeout) => {
            tokio::time::sleep(state.mock_service.timeout_delay()).await;
            ok()
        }
        Some(DependencyFault::Error) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
        Some(DependencyFault::Slow) => {
            tokio::time::sleep(state.mock_service.slow_delay()).await;
            ok()
        }
        Some(DependencyFault::Other(_)) | None => ok(),
    }
}
