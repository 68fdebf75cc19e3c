//! Server startup helper for the engine binary.
//!
//! Provides [`spawn_server`] which binds the listener eagerly and then
//! runs the HTTP + `WebSocket` server on a background Tokio task.
//!
//! # Usage
//!
//! ```rust,ignore
//! use resilience_observer::startup::spawn_server;
//!
//! let handle = spawn_server(&config.server, state.clone()).await?;
//! state.shutdown.cancel();
//! handle.await?;
//! ```

use resilience_core::config::ServerConfig;
use tokio::task::JoinHandle;

use crate::server::{ServerError, bind, serve};
use crate::state::AppState;

/// Errors that can occur when spawning the server.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The server failed to bind or start.
    #[error("server start error: {0}")]
    Server(#[from] ServerError),
}

/// Spawn the server on a background Tokio task.
///
/// The listener is bound before the task is spawned, so an address
/// already in use is reported here rather than inside the task. The
/// server stops when `state.shutdown` is cancelled; await the returned
/// handle to wait for in-flight requests to drain.
///
/// # Errors
///
/// Returns [`StartupError::Server`] if the listener cannot bind.
pub async fn spawn_server(
    config: &ServerConfig,
    state: AppState,
) -> Result<JoinHandle<()>, StartupError> {
    let listener = bind(config).await?;

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, state).await {
            tracing::error!(error = %e, "Server exited with error");
        }
    });

    tracing::info!(host = %config.host, port = config.port, "Server spawned on background task");

    Ok(handle)
}
