//! Axum router construction.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for cross-origin dashboard access.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` and `GET /health` -- service identity and health
/// - `GET /api/v1/ws/swarm` -- `WebSocket` subscriber channel
/// - `POST /api/swarm/initialize`, `POST /api/swarm/deploy`
/// - `GET /api/swarm/status`, `GET /api/swarm/deployments`
/// - `GET /api/agents/{id}` and its `tasks`, `activate`, `deactivate`
///   sub-routes
/// - `POST /api/disasters/report`
///
/// CORS allows any origin so the dashboard can be served separately.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/api/v1/ws/swarm", get(ws::ws_swarm))
        // Swarm
        .route("/api/swarm/initialize", post(handlers::initialize_swarm))
        .route("/api/swarm/deploy", post(handlers::deploy_swarm))
        .route("/api/swarm/status", get(handlers::swarm_status))
        .route("/api/swarm/deployments", get(handlers::list_deployments))
        // Agents
        .route("/api/agents/{id}", get(handlers::get_agent))
        .route("/api/agents/{id}/tasks", post(handlers::dispatch_task))
        .route("/api/agents/{id}/activate", post(handlers::activate_agent))
        .route("/api/agents/{id}/deactivate", post(handlers::deactivate_agent))
        // Disasters
        .route("/api/disasters/report", post(handlers::report_disaster))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
