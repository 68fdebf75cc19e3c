//! The agent registry: one record per id in `[1, N]`.
//!
//! The registry is plain data plus lookup rules. It has no interior
//! locking; [`SwarmOrchestrator`](crate::orchestrator::SwarmOrchestrator)
//! owns it behind a lock and is the only code that mutates it.

use chrono::Utc;
use resilience_types::{Agent, AgentId, AgentStatus, AgentType};

use crate::error::SwarmError;
use crate::partition::RolePartition;

/// Process-wide set of agent records.
///
/// # Invariants
///
/// - Exactly `N` records, stored in ascending id order, so the record for
///   id `k` lives at index `k - 1`.
/// - Every record's `agent_type` equals `partition.type_of(id)`.
#[derive(Debug, Clone)]
pub struct AgentRegistry {
    partition: RolePartition,
    agents: Vec<Agent>,
    initialized: bool,
}

impl AgentRegistry {
    /// Create a registry with every agent `offline`.
    pub fn new(partition: RolePartition) -> Self {
        let now = Utc::now();
        let agents = partition
            .ranges()
            .iter()
            .flat_map(|range| {
                (range.first.get()..=range.last.get()).map(move |id| Agent {
                    id: AgentId(id),
                    agent_type: range.role,
                    status: AgentStatus::Offline,
                    last_activity: now,
                    tasks_completed: 0,
                    current_task: None,
                })
            })
            .collect();
        Self {
            partition,
            agents,
            initialized: false,
        }
    }

    /// Reset every agent to `standby` with a fresh timestamp.
    ///
    /// Idempotent. Current tasks are dropped; completed-task counters are
    /// kept because they never decrease for the life of the process.
    pub fn initialize_all(&mut self) {
        let now = Utc::now();
        for agent in &mut self.agents {
            agent.status = AgentStatus::Standby;
            agent.last_activity = now;
            agent.current_task = None;
        }
        self.initialized = true;
    }

    /// Whether [`initialize_all`](Self::initialize_all) has run.
    pub const fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Swarm size `N`.
    pub const fn size(&self) -> u32 {
        self.partition.size()
    }

    /// The id-to-role partition.
    pub const fn partition(&self) -> &RolePartition {
        &self.partition
    }

    /// All records in ascending id order.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// Look up one record.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotFound`] if `id` is outside `[1, N]`.
    pub fn get(&self, id: AgentId) -> Result<&Agent, SwarmError> {
        id.index()
            .and_then(|i| self.agents.get(i))
            .ok_or(SwarmError::NotFound { id })
    }

    /// Role of the agent with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::InvalidId`] if `id` is outside `[1, N]`.
    pub fn type_of(&self, id: AgentId) -> Result<AgentType, SwarmError> {
        self.partition.type_of(id)
    }

    /// Set one agent's status, stamping its activity time.
    ///
    /// A supplied `task` becomes the current task. Moving to `standby` or
    /// `offline` clears the current task.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotFound`] if `id` is outside `[1, N]`.
    pub fn set_status(
        &mut self,
        id: AgentId,
        status: AgentStatus,
        task: Option<serde_json::Value>,
    ) -> Result<&Agent, SwarmError> {
        let agent = self.get_mut(id)?;
        agent.status = status;
        agent.last_activity = Utc::now();
        if let Some(task) = task {
            agent.current_task = Some(task);
        }
        if matches!(status, AgentStatus::Standby | AgentStatus::Offline) {
            agent.current_task = None;
        }
        Ok(agent)
    }

    /// Record a finished task: bump the counter, clear the current task,
    /// and return the agent to `active`.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::NotFound`] if `id` is outside `[1, N]`.
    pub fn complete_task(&mut self, id: AgentId) -> Result<&Agent, SwarmError> {
        let agent = self.get_mut(id)?;
        agent.tasks_completed = agent.tasks_completed.saturating_add(1);
        agent.current_task = None;
        agent.status = AgentStatus::Active;
        agent.last_activity = Utc::now();
        Ok(agent)
    }

    fn get_mut(&mut self, id: AgentId) -> Result<&mut Agent, SwarmError> {
        id.index()
            .and_then(|i| self.agents.get_mut(i))
            .ok_or(SwarmError::NotFound { id })
    }
}
