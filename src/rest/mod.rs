//! HTTP control surface.
//!
//! Exposes the scenario manager over JSON:
//! - `/api/v1/scenarios/...` single scenario start/stop/status and listing
//! - `/api/v1/composite/...` composite session start/stop/status
//! - `/health`, `/ready` probes that honor the health-check scenario
//! - `/api/v1/mock-service` a fake downstream that honors the dependency scenario
//!
//! Every request passes the latency middleware first.

use std::sync::Arc;

use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{MockServiceConfig, ServerConfig};
use crate::manager::ScenarioManager;

mod error;
mod health;
mod middleware;
mod scenarios;

pub use error::ApiError;

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<ScenarioManager>,
    pub mock_service: MockServiceConfig,
}

impl AppState {
    pub fn new(manager: Arc<ScenarioManager>, mock_service: MockServiceConfig) -> Self {
        Self {
            manager,
            mock_service,
        }
    }
}

/// Build the axum router (separated for testing).
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/scenarios", get(scenarios::list))
        .route("/api/v1/scenarios/:scenario/start", post(scenarios::start))
        .route("/api/v1/scenarios/:scenario/stop", post(scenarios::stop))
        .route("/api/v1/scenarios/:scenario/status", get(scenarios::status))
        .route("/api/v1/composite/start", post(scenarios::start_composite))
        .route("/api/v1/composite/stop", post(scenarios::stop_all))
        .route("/api/v1/composite/status", get(scenarios::current_session))
        .route("/health", get(health::health))
        .route("/ready", get(health::health))
        .route("/api/v1/mock-service", get(health::mock_service))
        .layer(from_fn_with_state(state.clone(), middleware::inject_latency))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the router until `shutdown` resolves.
///
/// When `server.port` is 0, the OS assigns an ephemeral port. The actual
/// bound address is always logged.
pub async fn serve(
    state: AppState,
    server: &ServerConfig,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(server.bind_address()).await?;
    info!(address = %listener.local_addr()?, "faultbox HTTP API listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
