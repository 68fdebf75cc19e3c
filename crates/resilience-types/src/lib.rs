//! Shared type definitions for the ResilienceGrid agent swarm.
//!
//! This crate is the single source of truth for every type that crosses a
//! crate boundary or goes on the wire. Types flow downstream to
//! `TypeScript` via `ts-rs` for the swarm dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Agent, subscriber, and disaster identifiers
//! - [`enums`] -- Agent roles, statuses, and control actions
//! - [`structs`] -- Agent records, snapshots, and deployment types
//! - [`messages`] -- Streaming channel envelopes and inbound commands

pub mod enums;
pub mod ids;
pub mod messages;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AgentAction, AgentStatus, AgentType, SwarmMode};
pub use ids::{AgentId, DisasterId, SubscriberId};
pub use messages::{ClientCommand, ServerMessage};
pub use structs::{
    Agent, AgentCell, DeploymentRecord, DeploymentRequest, DeploymentResult, DisasterReport,
    Location, StatusBatch, SwarmSnapshot, SwarmStats, TaskReport,
};
