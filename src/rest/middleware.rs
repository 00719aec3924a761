//! Latency injection middleware.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use super::AppState;
use crate::scenarios::NetworkLatency;

/// Delay every request by the latency scenario's current setting.
pub(super) async fn inject_latency(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(scenario) = state.manager.get_scenario("network_latency").await {
        if let Some(latency) = scenario.as_any().downcast_ref::<NetworkLatency>() {
            let delay = latency.latency().await;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }
    }

    next.run(request).await
}
