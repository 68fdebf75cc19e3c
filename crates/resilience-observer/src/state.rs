//! Shared application state for the HTTP/WebSocket server.
//!
//! [`AppState`] carries explicitly constructed handles to the command
//! processor and the subscription hub, plus the process shutdown token.
//! It is built once by the entry point and injected via Axum's `State`
//! extractor; there are no process-global instances.

use std::sync::Arc;

use resilience_core::config::ResilienceConfig;
use resilience_core::error::SwarmError;
use resilience_core::orchestrator::SwarmOrchestrator;
use tokio_util::sync::CancellationToken;

use crate::hub::SubscriptionHub;

/// Shared state for the Axum application.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The command processor owning the agent registry.
    pub orchestrator: Arc<SwarmOrchestrator>,
    /// The subscriber set.
    pub hub: Arc<SubscriptionHub>,
    /// Cancelled at shutdown; every connection task watches it.
    pub shutdown: CancellationToken,
    /// Frames buffered per subscriber connection.
    pub subscriber_buffer: usize,
}

impl AppState {
    /// Assemble state from already-built components.
    pub fn new(
        orchestrator: Arc<SwarmOrchestrator>,
        hub: Arc<SubscriptionHub>,
        shutdown: CancellationToken,
        subscriber_buffer: usize,
    ) -> Self {
        Self {
            orchestrator,
            hub,
            shutdown,
            subscriber_buffer: subscriber_buffer.max(1),
        }
    }

    /// Build fresh components from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Configuration`] if the swarm section is invalid.
    pub fn from_config(
        config: &ResilienceConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, SwarmError> {
        let orchestrator = Arc::new(SwarmOrchestrator::from_config(config)?);
        let hub = Arc::new(SubscriptionHub::from_config(&config.broadcast));
        Ok(Self::new(
            orchestrator,
            hub,
            shutdown,
            config.broadcast.subscriber_buffer,
        ))
    }
}
