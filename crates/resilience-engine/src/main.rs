//! Service binary for the ResilienceGrid swarm.
//!
//! This is the main entry point that wires together the command
//! processor, the subscription hub, the broadcast scheduler, and the
//! HTTP/`WebSocket` server. Every component is constructed here and
//! passed down explicitly; this function owns their lifecycle.
//!
//! # Startup Sequence
//!
//! 1. Load configuration (`RESILIENCE_CONFIG` or `resilience-config.yaml`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the orchestrator and hub
//! 4. Spawn the broadcast scheduler
//! 5. Bind and spawn the server
//! 6. Wait for SIGINT/SIGTERM
//!
//! # Shutdown Sequence
//!
//! The shared [`CancellationToken`] is cancelled; the server drains, the
//! scheduler is joined, and the hub closes every subscriber sink.

mod error;

use std::path::PathBuf;
use std::sync::Arc;

use resilience_core::config::{LogFormat, LoggingConfig, ResilienceConfig};
use resilience_observer::broadcaster::BroadcastScheduler;
use resilience_observer::startup::spawn_server;
use resilience_observer::state::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;

/// Environment variable naming the config file.
const CONFIG_ENV: &str = "RESILIENCE_CONFIG";

/// Config file used when [`CONFIG_ENV`] is unset.
const DEFAULT_CONFIG_PATH: &str = "resilience-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if configuration, logging, or server startup fails,
/// or if a background task panics during shutdown.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration. Logging depends on it, so report later.
    let (config, loaded_from) = load_config()?;

    // 2. Initialize structured logging.
    init_tracing(&config.logging)?;
    info!("resilience-engine starting");
    match &loaded_from {
        Some(path) => info!(path = %path.display(), "Configuration file loaded"),
        None => info!("Config file not found, using defaults"),
    }
    info!(
        swarm_size = config.swarm.size,
        interval_ms = config.broadcast.interval_ms,
        max_subscribers = config.broadcast.max_subscribers,
        delivery_timeout_ms = config.broadcast.delivery_timeout_ms,
        "Configuration loaded"
    );

    // 3. Build the orchestrator and hub.
    let shutdown = CancellationToken::new();
    let state = AppState::from_config(&config, shutdown.clone())?;
    info!(agents = state.orchestrator.size(), "Swarm registry created (offline until initialized)");

    // 4. Spawn the broadcast scheduler.
    let scheduler = BroadcastScheduler::spawn(
        Arc::clone(&state.orchestrator),
        Arc::clone(&state.hub),
        config.broadcast.interval(),
        shutdown.clone(),
    );

    // 5. Bind and spawn the server.
    let mut server = spawn_server(&config.server, state.clone()).await?;

    // 6. Wait for a signal, or for the server to die on its own.
    spawn_signal_handler(shutdown.clone());
    let server_exited = tokio::select! {
        () = shutdown.cancelled() => false,
        result = &mut server => {
            result?;
            true
        }
    };
    if server_exited {
        warn!("Server exited unexpectedly, shutting down");
        shutdown.cancel();
    } else {
        info!("Shutdown requested, draining connections");
        server.await?;
    }

    scheduler.shutdown().await?;
    let closed = state.hub.close_all().await;

    info!(closed_subscribers = closed, "resilience-engine shutdown complete");
    Ok(())
}

/// Resolve the config file path from the `RESILIENCE_CONFIG` value.
fn config_path(from_env: Option<String>) -> PathBuf {
    from_env
        .filter(|p| !p.trim().is_empty())
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Load configuration, falling back to defaults when the file is absent.
///
/// Returns the path the configuration was read from, if any.
fn load_config() -> Result<(ResilienceConfig, Option<PathBuf>), EngineError> {
    let path = config_path(std::env::var(CONFIG_ENV).ok());
    if path.exists() {
        let config = ResilienceConfig::from_file(&path)?;
        Ok((config, Some(path)))
    } else {
        // Parsing the empty document still applies env overrides and
        // validation.
        Ok((ResilienceConfig::parse("")?, None))
    }
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over `logging.level`.
fn init_tracing(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let result = match logging.format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    result.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
fn spawn_signal_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            () = interrupt() => info!("received SIGINT"),
            () = terminate() => info!("received SIGTERM"),
            () = shutdown.cancelled() => return,
        }
        shutdown.cancel();
    });
}

async fn interrupt() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{SignalKind, signal};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
