//! Error taxonomy for swarm commands and startup validation.

use resilience_types::{AgentId, AgentStatus};

/// Errors raised by the registry and the command processor.
///
/// Every variant except [`SwarmError::Configuration`] is a rejected
/// command: the operation made no change to the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwarmError {
    /// The agent id is not in `[1, N]`.
    #[error("agent {id} not found")]
    NotFound {
        /// The requested id.
        id: AgentId,
    },

    /// The id falls outside the configured role partition.
    #[error("agent id {id} is outside the configured range 1..={max}")]
    InvalidId {
        /// The requested id.
        id: AgentId,
        /// Largest valid id.
        max: u32,
    },

    /// A mutating command arrived before `initialize_swarm`.
    #[error("swarm is not initialized")]
    NotInitialized,

    /// The agent cannot take work in its current status.
    #[error("agent {id} is {status} and cannot accept tasks")]
    AgentUnavailable {
        /// The target agent.
        id: AgentId,
        /// Its status at the time of the request.
        status: AgentStatus,
    },

    /// Partition, grid, or policy configuration is inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),
}
