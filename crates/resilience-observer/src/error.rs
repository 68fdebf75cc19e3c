//! Error types for the HTTP surface.
//!
//! [`ObserverError`] unifies all failure modes into a single enum that
//! can be converted into an Axum HTTP response via its
//! [`IntoResponse`](axum::response::IntoResponse) implementation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use resilience_core::error::SwarmError;

/// Errors that can occur in the HTTP API layer.
#[derive(Debug, thiserror::Error)]
pub enum ObserverError {
    /// A swarm command was rejected.
    #[error(transparent)]
    Swarm(#[from] SwarmError),

    /// The path segment is not an agent id at all (negative, non-numeric,
    /// or too large).
    #[error("agent {0} not found")]
    UnknownAgent(String),
}

impl ObserverError {
    /// HTTP status for this error.
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Swarm(SwarmError::NotFound { .. } | SwarmError::InvalidId { .. })
            | Self::UnknownAgent(_) => StatusCode::NOT_FOUND,
            Self::Swarm(SwarmError::NotInitialized | SwarmError::AgentUnavailable { .. }) => {
                StatusCode::CONFLICT
            }
            Self::Swarm(SwarmError::Configuration(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ObserverError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = serde_json::json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}
