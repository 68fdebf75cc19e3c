//! Subscriber fan-out and the HTTP/WebSocket surface for the
//! ResilienceGrid swarm.
//!
//! This crate provides:
//!
//! - **Subscription hub** ([`hub`]): the live subscriber set, with
//!   per-subscriber delivery timeouts and automatic removal of failed
//!   subscribers.
//! - **Broadcast scheduler** ([`broadcaster`]): a cancellable background
//!   task that pushes an `agent_status_batch` every interval.
//! - **`WebSocket` endpoint** (`/api/v1/ws/swarm`): initial `swarm_status`
//!   on connect, live batches afterwards, inbound channel commands.
//! - **REST endpoints** under `/api` for the swarm command surface.
//!
//! # Architecture
//!
//! All swarm state lives in the
//! [`SwarmOrchestrator`](resilience_core::orchestrator::SwarmOrchestrator).
//! Handlers and the scheduler only issue commands and take snapshots
//! through it. The hub owns nothing but subscriber sinks.

pub mod broadcaster;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod server;
pub mod startup;
pub mod state;
pub mod ws;

// Re-export primary types for convenience.
pub use broadcaster::{BroadcastScheduler, TickOutcome};
pub use hub::{BroadcastReport, DeliveryFailure, Frame, HubError, SubscriptionHub};
pub use router::build_router;
pub use server::ServerError;
pub use state::AppState;
