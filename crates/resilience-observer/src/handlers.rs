//! REST API endpoint handlers.
//!
//! Every handler is a thin translation onto a
//! [`SwarmOrchestrator`](resilience_core::orchestrator::SwarmOrchestrator)
//! command or read. Rejections become [`ObserverError`] responses.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Service identity |
//! | `GET` | `/health` | Liveness plus swarm mode |
//! | `POST` | `/api/swarm/initialize` | Reset every agent to standby |
//! | `POST` | `/api/swarm/deploy` | Deploy agents for a disaster type |
//! | `GET` | `/api/swarm/status` | Current snapshot |
//! | `GET` | `/api/swarm/deployments` | Deployment log |
//! | `GET` | `/api/agents/{id}` | Single agent record |
//! | `POST` | `/api/agents/{id}/tasks` | Run one task on one agent |
//! | `POST` | `/api/agents/{id}/activate` | Set one agent active |
//! | `POST` | `/api/agents/{id}/deactivate` | Return one agent to standby |
//! | `POST` | `/api/disasters/report` | Log a disaster and deploy for it |

use axum::Json;
use axum::extract::{Path, State};
use resilience_types::{
    Agent, AgentAction, AgentId, DeploymentRecord, DeploymentRequest, DeploymentResult,
    DisasterId, DisasterReport, SwarmMode, SwarmSnapshot, TaskReport,
};
use serde::Serialize;
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;
use crate::ws::announce;

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    /// Always `operational`.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct Health {
    /// Always `healthy`.
    pub status: &'static str,
    /// Agents currently active or processing.
    pub agents_active: u32,
    /// Coarse swarm mode.
    pub swarm_mode: SwarmMode,
}

/// Body of `POST /api/swarm/initialize`.
#[derive(Debug, Serialize)]
pub struct InitializeResponse {
    /// Always `success`.
    pub status: &'static str,
    /// Human-readable summary.
    pub message: String,
    /// Number of agents reset to standby.
    pub total_agents: u32,
}

/// Body of `POST /api/disasters/report`.
#[derive(Debug, Serialize)]
pub struct ReportResponse {
    /// Always `received`.
    pub status: &'static str,
    /// Identifier allocated for the disaster.
    pub disaster_id: DisasterId,
    /// Agents activated for it.
    pub deployed_count: u32,
    /// Human-readable summary.
    pub message: &'static str,
}

// ---------------------------------------------------------------------------
// Service status
// ---------------------------------------------------------------------------

/// `GET /`
pub async fn index() -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "operational",
        service: "ResilienceGrid",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Json<Health> {
    let (swarm_mode, agents_active) = state.orchestrator.mode().await;
    Json(Health {
        status: "healthy",
        agents_active,
        swarm_mode,
    })
}

// ---------------------------------------------------------------------------
// Swarm commands
// ---------------------------------------------------------------------------

/// `POST /api/swarm/initialize`
pub async fn initialize_swarm(State(state): State<AppState>) -> Json<InitializeResponse> {
    let total_agents = state.orchestrator.initialize_swarm().await;
    announce(
        &state,
        format!("Swarm activated - {total_agents} agents initializing"),
    );
    Json(InitializeResponse {
        status: "success",
        message: "Swarm initialized".to_owned(),
        total_agents,
    })
}

/// `POST /api/swarm/deploy`
///
/// # Errors
///
/// 409 before the swarm is initialized.
pub async fn deploy_swarm(
    State(state): State<AppState>,
    Json(request): Json<DeploymentRequest>,
) -> Result<Json<DeploymentResult>, ObserverError> {
    let deployment = state
        .orchestrator
        .deploy_request(&request, DisasterId::new())
        .await?;
    announce(
        &state,
        format!("Deployed {} agents", deployment.result.deployed_count),
    );
    Ok(Json(deployment.result))
}

/// `GET /api/swarm/status`
pub async fn swarm_status(State(state): State<AppState>) -> Json<SwarmSnapshot> {
    Json(state.orchestrator.snapshot().await)
}

/// `GET /api/swarm/deployments`
pub async fn list_deployments(State(state): State<AppState>) -> Json<Vec<DeploymentRecord>> {
    Json(state.orchestrator.deployments().await)
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// `GET /api/agents/{id}`
///
/// # Errors
///
/// 404 if `id` is not an integer in `[1, N]`.
pub async fn get_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ObserverError> {
    let id = parse_agent_id(&id)?;
    Ok(Json(state.orchestrator.agent(id).await?))
}

/// `POST /api/agents/{id}/tasks`
///
/// The request body is the opaque task descriptor.
///
/// # Errors
///
/// 404 for an unknown id, 409 before initialization or when the agent
/// cannot take work.
pub async fn dispatch_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(task): Json<serde_json::Value>,
) -> Result<Json<TaskReport>, ObserverError> {
    let id = parse_agent_id(&id)?;
    Ok(Json(state.orchestrator.dispatch_task(id, task).await?))
}

/// `POST /api/agents/{id}/activate`
///
/// # Errors
///
/// 404 for an unknown id, 409 before initialization.
pub async fn activate_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ObserverError> {
    let id = parse_agent_id(&id)?;
    let agent = state
        .orchestrator
        .apply_action(id, AgentAction::Activate)
        .await?;
    Ok(Json(agent))
}

/// `POST /api/agents/{id}/deactivate`
///
/// # Errors
///
/// 404 for an unknown id, 409 before initialization.
pub async fn deactivate_agent(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Agent>, ObserverError> {
    let id = parse_agent_id(&id)?;
    let agent = state
        .orchestrator
        .apply_action(id, AgentAction::Deactivate)
        .await?;
    Ok(Json(agent))
}

// ---------------------------------------------------------------------------
// Disaster reports
// ---------------------------------------------------------------------------

/// `POST /api/disasters/report`
///
/// # Errors
///
/// 409 before the swarm is initialized.
pub async fn report_disaster(
    State(state): State<AppState>,
    Json(report): Json<DisasterReport>,
) -> Result<Json<ReportResponse>, ObserverError> {
    let disaster_id = DisasterId::new();
    let request = DeploymentRequest {
        disaster_type: report.disaster_type,
        location: report.location,
        severity: report.severity,
    };
    let deployment = state
        .orchestrator
        .deploy_request(&request, disaster_id)
        .await?;
    info!(
        disaster_id = %disaster_id,
        description = report.description.as_deref().unwrap_or(""),
        "Disaster report received"
    );
    announce(
        &state,
        format!("Deployed {} agents", deployment.result.deployed_count),
    );
    Ok(Json(ReportResponse {
        status: "received",
        disaster_id,
        deployed_count: deployment.result.deployed_count,
        message: "Disaster report logged, agents deploying",
    }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse an agent id from a path segment.
///
/// Anything that is not a `u32` cannot name an agent and is reported as
/// not found; range checks against `N` happen in the orchestrator.
fn parse_agent_id(s: &str) -> Result<AgentId, ObserverError> {
    s.parse::<u32>()
        .ok()
        .map(AgentId)
        .ok_or_else(|| ObserverError::UnknownAgent(s.to_owned()))
}
