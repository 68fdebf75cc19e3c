//! Core entity and value structs for the ResilienceGrid swarm.
//!
//! Field names on the wire follow the dashboard contract, which is why a
//! few fields carry `serde(rename)` attributes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AgentStatus, AgentType};
use crate::ids::{AgentId, DisasterId};

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Identity and observable state of one swarm member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Agent {
    /// Positional id in `[1, N]`.
    pub id: AgentId,
    /// Role derived from the id partition.
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    /// Current operational status.
    pub status: AgentStatus,
    /// Stamped on every status transition.
    pub last_activity: DateTime<Utc>,
    /// Number of tasks this agent has finished.
    pub tasks_completed: u64,
    /// Opaque descriptor of the task in progress, if any.
    pub current_task: Option<serde_json::Value>,
}

/// One cell of the snapshot grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentCell {
    /// Agent id.
    pub id: AgentId,
    /// Status at snapshot time.
    pub status: AgentStatus,
    /// Agent role.
    #[serde(rename = "type")]
    pub agent_type: AgentType,
}

impl From<&Agent> for AgentCell {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            status: agent.status,
            agent_type: agent.agent_type,
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// Immutable point-in-time view of the whole swarm.
///
/// Built by copying out of the registry; never aliases live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SwarmSnapshot {
    /// Swarm size `N`.
    pub total_agents: u32,
    /// Agents with status `active`.
    #[serde(rename = "active")]
    pub active_count: u32,
    /// Agents with status `standby`.
    #[serde(rename = "standby")]
    pub standby_count: u32,
    /// When the snapshot was taken.
    pub timestamp: DateTime<Utc>,
    /// Row-major grid of cells in ascending id order.
    #[serde(rename = "agent_grid")]
    pub grid: Vec<Vec<AgentCell>>,
}

impl SwarmSnapshot {
    /// Aggregate counts in the shape carried by status batches.
    pub const fn stats(&self) -> SwarmStats {
        SwarmStats {
            total: self.total_agents,
            active: self.active_count,
            standby: self.standby_count,
        }
    }

    /// Iterate every cell in ascending id order.
    pub fn cells(&self) -> impl Iterator<Item = &AgentCell> {
        self.grid.iter().flatten()
    }
}

/// Aggregate swarm counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SwarmStats {
    /// Swarm size.
    pub total: u32,
    /// Active agents.
    pub active: u32,
    /// Standby agents.
    pub standby: u32,
}

/// Payload of the recurring `agent_status_batch` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct StatusBatch {
    /// The snapshot grid.
    pub agents: Vec<Vec<AgentCell>>,
    /// Aggregate counts.
    pub stats: SwarmStats,
}

impl From<SwarmSnapshot> for StatusBatch {
    fn from(snapshot: SwarmSnapshot) -> Self {
        let stats = snapshot.stats();
        Self {
            agents: snapshot.grid,
            stats,
        }
    }
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

/// Geographic point of a disaster.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Location {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Request to deploy agents against a disaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DeploymentRequest {
    /// Disaster type key (e.g. `earthquake`).
    #[serde(alias = "disasterType")]
    pub disaster_type: String,
    /// Where the disaster is.
    pub location: Location,
    /// Free-form severity label.
    #[serde(default = "default_severity")]
    pub severity: String,
}

/// Outcome of a deployment command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DeploymentResult {
    /// Number of agents set to `active`.
    pub deployed_count: u32,
    /// The selected ids in ascending order.
    pub agent_ids: Vec<AgentId>,
    /// The disaster type as requested.
    pub disaster_type: String,
}

/// A deployment kept in the orchestrator's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DeploymentRecord {
    /// Disaster this deployment responded to.
    pub disaster_id: DisasterId,
    /// Disaster type as requested.
    pub disaster_type: String,
    /// Disaster location.
    pub location: Location,
    /// Severity label.
    pub severity: String,
    /// Number of agents activated.
    pub deployed_count: u32,
    /// When the deployment happened.
    pub deployed_at: DateTime<Utc>,
}

/// Incoming report of a disaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DisasterReport {
    /// Disaster type key.
    #[serde(alias = "disasterType")]
    pub disaster_type: String,
    /// Where the disaster is.
    pub location: Location,
    /// Severity label.
    #[serde(default = "default_severity")]
    pub severity: String,
    /// Optional free-form description.
    #[serde(default)]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Result of one task processed by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TaskReport {
    /// Agent that processed the task.
    pub agent_id: AgentId,
    /// Role of that agent.
    #[serde(rename = "type")]
    pub agent_type: AgentType,
    /// What the role does.
    pub summary: String,
    /// Role-specific result label (e.g. `alerts_dispatched`).
    pub result: String,
    /// Name of the role-specific work counter.
    pub metric: String,
    /// Value of that counter for this task.
    pub processed: u64,
    /// Agent's lifetime completed task count after this task.
    pub tasks_completed: u64,
}

fn default_severity() -> String {
    "medium".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_uses_dashboard_field_names() {
        let snapshot = SwarmSnapshot {
            total_agents: 1,
            active_count: 1,
            standby_count: 0,
            timestamp: Utc::now(),
            grid: vec![vec![AgentCell {
                id: AgentId(1),
                status: AgentStatus::Active,
                agent_type: AgentType::Social,
            }]],
        };
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["total_agents"], 1);
        assert_eq!(json["active"], 1);
        assert_eq!(json["standby"], 0);
        assert_eq!(json["agent_grid"][0][0]["type"], "social");
        assert_eq!(json["agent_grid"][0][0]["status"], "active");
    }

    #[test]
    fn deployment_request_accepts_camel_case_type() {
        let raw = r#"{"disasterType":"flood","location":{"lat":1.5,"lng":2.5}}"#;
        let req: DeploymentRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.disaster_type, "flood");
        assert_eq!(req.severity, "medium");
    }

    #[test]
    fn status_batch_carries_snapshot_stats() {
        let snapshot = SwarmSnapshot {
            total_agents: 4,
            active_count: 1,
            standby_count: 3,
            timestamp: Utc::now(),
            grid: Vec::new(),
        };
        let batch = StatusBatch::from(snapshot);
        assert_eq!(
            batch.stats,
            SwarmStats {
                total: 4,
                active: 1,
                standby: 3
            }
        );
    }
}
