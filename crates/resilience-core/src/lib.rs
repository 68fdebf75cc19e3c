//! Agent registry, command processing, and snapshots for the
//! ResilienceGrid swarm.
//!
//! This crate owns every piece of swarm state. Nothing outside it mutates
//! an agent record.
//!
//! # Modules
//!
//! - [`capability`] -- Static per-role capability table and task processing.
//! - [`config`] -- Configuration loading from `resilience-config.yaml` into
//!   strongly-typed structs, plus startup validation.
//! - [`error`] -- [`SwarmError`], the command and validation error type.
//! - [`orchestrator`] -- [`SwarmOrchestrator`], the serialized command
//!   processor (`initialize_swarm`, `deploy`, agent actions, tasks).
//! - [`partition`] -- Contiguous id-to-role partition.
//! - [`policy`] -- Disaster-type to agent-count selection policy.
//! - [`registry`] -- The agent records themselves.
//! - [`snapshot`] -- Grid layout and point-in-time swarm snapshots.
//!
//! [`SwarmError`]: error::SwarmError
//! [`SwarmOrchestrator`]: orchestrator::SwarmOrchestrator

pub mod capability;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod partition;
pub mod policy;
pub mod registry;
pub mod snapshot;
