//! The command processor: sole owner and mutator of the agent registry.
//!
//! [`SwarmOrchestrator`] wraps the registry in a [`RwLock`]. Every
//! mutating command takes the write guard for its whole duration, so two
//! commands never interleave. Snapshots and single-agent reads take the
//! read guard, so a reader never sees a record mid-update.
//!
//! The orchestrator is constructed explicitly by the process entry point
//! and shared as `Arc<SwarmOrchestrator>`; there is no global instance.

use chrono::Utc;
use resilience_types::{
    Agent, AgentAction, AgentId, AgentStatus, DeploymentRecord, DeploymentRequest,
    DeploymentResult, DisasterId, Location, SwarmMode, SwarmSnapshot, TaskReport,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::capability::capability_for;
use crate::config::ResilienceConfig;
use crate::error::SwarmError;
use crate::partition::RolePartition;
use crate::policy::SelectionPolicy;
use crate::registry::AgentRegistry;
use crate::snapshot::{GridShape, build_snapshot};

/// Maximum number of deployments kept in the log.
pub const MAX_DEPLOYMENTS: usize = 256;

/// A completed deployment: the caller-facing result plus the log record.
#[derive(Debug, Clone, PartialEq)]
pub struct Deployment {
    /// What the command returns to its caller.
    pub result: DeploymentResult,
    /// What was appended to the deployment log.
    pub record: DeploymentRecord,
}

/// Serializes all registry mutations and exposes the deployment policy.
#[derive(Debug)]
pub struct SwarmOrchestrator {
    registry: RwLock<AgentRegistry>,
    policy: SelectionPolicy,
    grid: GridShape,
    size: u32,
    deployments: Mutex<Vec<DeploymentRecord>>,
}

impl SwarmOrchestrator {
    /// Build an orchestrator from validated configuration.
    ///
    /// Every agent starts `offline`; call
    /// [`initialize_swarm`](Self::initialize_swarm) before any other command.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Configuration`] if the partition, grid, or
    /// deployment policy is inconsistent with the swarm size.
    pub fn from_config(config: &ResilienceConfig) -> Result<Self, SwarmError> {
        let size = config.swarm.size;
        let partition = RolePartition::from_allocations(&config.swarm.roles, size)?;
        let grid = GridShape::new(size, config.swarm.grid_width)?;
        let policy = SelectionPolicy::from_config(&config.deployment, size)?;
        Ok(Self::new(partition, grid, policy))
    }

    /// Assemble an orchestrator from already-validated parts.
    pub fn new(partition: RolePartition, grid: GridShape, policy: SelectionPolicy) -> Self {
        let size = partition.size();
        debug!(
            agents = size,
            grid_width = grid.width(),
            grid_rows = grid.rows(),
            "Swarm orchestrator ready"
        );
        Self {
            registry: RwLock::new(AgentRegistry::new(partition)),
            policy,
            grid,
            size,
            deployments: Mutex::new(Vec::new()),
        }
    }

    /// Swarm size `N`.
    pub const fn size(&self) -> u32 {
        self.size
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    /// Reset every agent to `standby`. Safe to call repeatedly.
    ///
    /// Returns the number of agents initialized.
    pub async fn initialize_swarm(&self) -> u32 {
        let mut registry = self.registry.write().await;
        registry.initialize_all();
        info!(agents = registry.size(), "Swarm initialized");
        registry.size()
    }

    /// Activate the agents the policy selects for `disaster_type`.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotInitialized`] before initialization.
    pub async fn deploy(
        &self,
        disaster_type: &str,
        location: Location,
    ) -> Result<DeploymentResult, SwarmError> {
        let request = DeploymentRequest {
            disaster_type: disaster_type.to_owned(),
            location,
            severity: "medium".to_owned(),
        };
        self.deploy_request(&request, DisasterId::new())
            .await
            .map(|d| d.result)
    }

    /// Activate agents for a full deployment request and log it under
    /// `disaster_id`.
    ///
    /// Either every selected agent is activated or none is.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotInitialized`] before initialization.
    pub async fn deploy_request(
        &self,
        request: &DeploymentRequest,
        disaster_id: DisasterId,
    ) -> Result<Deployment, SwarmError> {
        let agent_ids = self.policy.select(&request.disaster_type);
        {
            let mut registry = self.registry.write().await;
            if !registry.is_initialized() {
                return Err(SwarmError::NotInitialized);
            }
            // Check every id before touching any of them.
            for id in &agent_ids {
                registry.get(*id)?;
            }
            for id in &agent_ids {
                registry.set_status(*id, AgentStatus::Active, None)?;
            }
        }

        let deployed_count = u32::try_from(agent_ids.len()).unwrap_or(u32::MAX);
        info!(
            disaster_id = %disaster_id,
            disaster_type = %request.disaster_type,
            severity = %request.severity,
            lat = request.location.lat,
            lng = request.location.lng,
            deployed = deployed_count,
            known_type = self.policy.is_known(&request.disaster_type),
            "Agents deployed"
        );

        let record = DeploymentRecord {
            disaster_id,
            disaster_type: request.disaster_type.clone(),
            location: request.location,
            severity: request.severity.clone(),
            deployed_count,
            deployed_at: Utc::now(),
        };
        {
            let mut log = self.deployments.lock().await;
            log.push(record.clone());
            if log.len() > MAX_DEPLOYMENTS {
                let drain_count = log.len().saturating_sub(MAX_DEPLOYMENTS);
                log.drain(..drain_count);
            }
        }

        Ok(Deployment {
            result: DeploymentResult {
                deployed_count,
                agent_ids,
                disaster_type: request.disaster_type.clone(),
            },
            record,
        })
    }

    /// Move one agent to `active` or back to `standby`.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotInitialized`] before initialization and
    /// [`SwarmError::NotFound`] for an unknown id.
    pub async fn apply_action(&self, id: AgentId, action: AgentAction) -> Result<Agent, SwarmError> {
        let mut registry = self.registry.write().await;
        if !registry.is_initialized() {
            return Err(SwarmError::NotInitialized);
        }
        let status = match action {
            AgentAction::Activate => AgentStatus::Active,
            AgentAction::Deactivate => AgentStatus::Standby,
        };
        let agent = registry.set_status(id, status, None)?.clone();
        debug!(agent_id = %id, status = %agent.status, "Agent status changed");
        Ok(agent)
    }

    /// Run one task on one agent through its role capability.
    ///
    /// The agent is `processing` with the task as its current task while
    /// the capability runs; the registry lock is not held during that
    /// call. Afterwards the completed counter is bumped and the agent
    /// returns to `active`, unless another command moved it meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotInitialized`] before initialization,
    /// [`SwarmError::NotFound`] for an unknown id, and
    /// [`SwarmError::AgentUnavailable`] if the agent is not `standby` or
    /// `active`.
    pub async fn dispatch_task(
        &self,
        id: AgentId,
        task: serde_json::Value,
    ) -> Result<TaskReport, SwarmError> {
        let role = {
            let mut registry = self.registry.write().await;
            if !registry.is_initialized() {
                return Err(SwarmError::NotInitialized);
            }
            let agent = registry.get(id)?;
            if !agent.status.is_available() {
                return Err(SwarmError::AgentUnavailable {
                    id,
                    status: agent.status,
                });
            }
            let role = agent.agent_type;
            registry.set_status(id, AgentStatus::Processing, Some(task.clone()))?;
            role
        };

        let mut report = capability_for(role).process(id, &task);

        let mut registry = self.registry.write().await;
        let still_processing = registry
            .get(id)
            .is_ok_and(|a| a.status == AgentStatus::Processing);
        let agent = if still_processing {
            registry.complete_task(id)?
        } else {
            registry.get(id)?
        };
        report.tasks_completed = agent.tasks_completed;
        debug!(
            agent_id = %id,
            role = %role,
            result = %report.result,
            tasks_completed = report.tasks_completed,
            "Task completed"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// A fresh snapshot of the whole swarm.
    pub async fn snapshot(&self) -> SwarmSnapshot {
        let registry = self.registry.read().await;
        build_snapshot(&registry, self.grid)
    }

    /// A copy of one agent record.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotFound`] if `id` is outside `[1, N]`.
    pub async fn agent(&self, id: AgentId) -> Result<Agent, SwarmError> {
        self.registry.read().await.get(id).cloned()
    }

    /// Coarse swarm mode and the number of agents currently working.
    pub async fn mode(&self) -> (SwarmMode, u32) {
        let registry = self.registry.read().await;
        if !registry.is_initialized() {
            return (SwarmMode::Offline, 0);
        }
        let working = registry
            .agents()
            .iter()
            .filter(|a| matches!(a.status, AgentStatus::Active | AgentStatus::Processing))
            .count();
        let working = u32::try_from(working).unwrap_or(u32::MAX);
        let mode = if working == 0 {
            SwarmMode::Standby
        } else {
            SwarmMode::Active
        };
        (mode, working)
    }

    /// The deployment log, oldest first.
    pub async fn deployments(&self) -> Vec<DeploymentRecord> {
        self.deployments.lock().await.clone()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn orchestrator() -> SwarmOrchestrator {
        SwarmOrchestrator::from_config(&ResilienceConfig::default()).unwrap()
    }

    const HERE: Location = Location {
        lat: 37.77,
        lng: -122.42,
    };

    #[tokio::test]
    async fn initialize_leaves_everyone_on_standby() {
        let orch = orchestrator();
        assert_eq!(orch.initialize_swarm().await, 100);
        let snap = orch.snapshot().await;
        assert_eq!(snap.active_count, 0);
        assert_eq!(snap.standby_count, 100);
        assert!(snap.cells().all(|c| c.status == AgentStatus::Standby));
    }

    #[tokio::test]
    async fn deploy_before_initialize_is_rejected_without_mutation() {
        let orch = orchestrator();
        let result = orch.deploy("earthquake", HERE).await;
        assert_eq!(result, Err(SwarmError::NotInitialized));
        let snap = orch.snapshot().await;
        assert_eq!(snap.active_count, 0);
        assert!(snap.cells().all(|c| c.status == AgentStatus::Offline));
        assert!(orch.deployments().await.is_empty());
    }

    #[tokio::test]
    async fn earthquake_activates_first_fifty() {
        let orch = orchestrator();
        orch.initialize_swarm().await;
        let result = orch.deploy("earthquake", HERE).await.unwrap();
        assert_eq!(result.deployed_count, 50);
        assert_eq!(result.disaster_type, "earthquake");
        assert_eq!(result.agent_ids, (1..=50).map(AgentId).collect::<Vec<_>>());

        let snap = orch.snapshot().await;
        assert_eq!(snap.active_count, 50);
        assert_eq!(snap.standby_count, 50);
        for cell in snap.cells() {
            let expected = if cell.id.get() <= 50 {
                AgentStatus::Active
            } else {
                AgentStatus::Standby
            };
            assert_eq!(cell.status, expected, "agent {}", cell.id);
        }
    }

    #[tokio::test]
    async fn unknown_type_uses_default_selection() {
        let orch = orchestrator();
        orch.initialize_swarm().await;
        let result = orch.deploy("unknown-type", HERE).await;
        assert_eq!(result.map(|r| r.deployed_count), Ok(30));
    }

    #[tokio::test]
    async fn deployments_are_logged() {
        let orch = orchestrator();
        orch.initialize_swarm().await;
        let _ = orch.deploy("flood", HERE).await;
        let _ = orch.deploy("wildfire", HERE).await;
        let log = orch.deployments().await;
        assert_eq!(log.len(), 2);
        assert_eq!(log.first().map(|r| r.deployed_count), Some(60));
        assert_eq!(log.get(1).map(|r| r.disaster_type.as_str()), Some("wildfire"));
    }

    #[tokio::test]
    async fn agent_lookup_rejects_out_of_range() {
        let orch = orchestrator();
        assert_eq!(
            orch.agent(AgentId(0)).await,
            Err(SwarmError::NotFound { id: AgentId(0) })
        );
        assert_eq!(
            orch.agent(AgentId(101)).await,
            Err(SwarmError::NotFound { id: AgentId(101) })
        );
        assert!(orch.agent(AgentId(100)).await.is_ok());
    }

    #[tokio::test]
    async fn apply_action_toggles_one_agent() {
        let orch = orchestrator();
        assert_eq!(
            orch.apply_action(AgentId(3), AgentAction::Activate).await,
            Err(SwarmError::NotInitialized)
        );
        orch.initialize_swarm().await;
        let agent = orch.apply_action(AgentId(3), AgentAction::Activate).await;
        assert_eq!(agent.map(|a| a.status), Ok(AgentStatus::Active));
        let agent = orch.apply_action(AgentId(3), AgentAction::Deactivate).await;
        assert_eq!(agent.map(|a| a.status), Ok(AgentStatus::Standby));
    }

    #[tokio::test]
    async fn dispatch_task_runs_capability_and_counts() {
        let orch = orchestrator();
        orch.initialize_swarm().await;
        let report = orch
            .dispatch_task(AgentId(97), serde_json::json!({"message": "evacuate"}))
            .await
            .unwrap();
        assert_eq!(report.result, "alerts_dispatched");
        assert_eq!(report.tasks_completed, 1);

        let agent = orch.agent(AgentId(97)).await.unwrap();
        assert_eq!(agent.status, AgentStatus::Active);
        assert_eq!(agent.tasks_completed, 1);
        assert!(agent.current_task.is_none());
    }

    #[tokio::test]
    async fn dispatch_task_refuses_offline_agents() {
        let orch = orchestrator();
        assert_eq!(
            orch.dispatch_task(AgentId(1), serde_json::Value::Null).await,
            Err(SwarmError::NotInitialized)
        );
        orch.initialize_swarm().await;
        assert!(matches!(
            orch.dispatch_task(AgentId(0), serde_json::Value::Null).await,
            Err(SwarmError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn mode_tracks_deployment() {
        let orch = orchestrator();
        assert_eq!(orch.mode().await, (SwarmMode::Offline, 0));
        orch.initialize_swarm().await;
        assert_eq!(orch.mode().await, (SwarmMode::Standby, 0));
        let _ = orch.deploy("earthquake", HERE).await;
        assert_eq!(orch.mode().await, (SwarmMode::Active, 50));
    }

    #[tokio::test]
    async fn concurrent_commands_and_snapshots_stay_consistent() {
        let orch = Arc::new(orchestrator());
        orch.initialize_swarm().await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let orch = Arc::clone(&orch);
            handles.push(tokio::spawn(async move {
                if i % 2 == 0 {
                    let _ = orch.deploy("flood", HERE).await;
                } else {
                    orch.initialize_swarm().await;
                }
                orch.snapshot().await
            }));
        }
        for handle in handles {
            let snap = handle.await.unwrap();
            // Deploy and initialize each apply atomically, so a snapshot is
            // either fully reset or has exactly the flood prefix active.
            assert!(snap.active_count == 0 || snap.active_count == 60);
            assert_eq!(snap.active_count + snap.standby_count, 100);
        }
    }
}
