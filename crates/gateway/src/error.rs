//! The error surface of the chat API.
//!
//! Every handler failure maps to one `ApiError` variant, which carries a
//! stable wire `kind` next to a human-readable message:
//!
//! ```json
//! { "error": { "kind": "not_found", "message": "conversation 42 not found" } }
//! ```
//!
//! Clients branch on `kind`; the message is for people.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use taskmind_agent::TurnError;
use taskmind_core::error::StoreError;
use thiserror::Error;

/// Everything a gateway handler can fail with.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request payload failed validation.
    #[error("{0}")]
    Validation(String),

    /// Missing, malformed, or expired credentials.
    #[error("{0}")]
    Auth(String),

    /// A valid token addressing another user's path.
    #[error("Not authorized to access this user's chat")]
    OwnerMismatch,

    /// The addressed resource does not exist for this caller.
    #[error("{what} not found")]
    NotFound { what: String },

    /// The model did not answer within the reasoning budget.
    #[error("The assistant took too long to respond. Please try again.")]
    OrchestratorTimeout,

    /// The turn failed for a reason other than a timeout.
    #[error("{0}")]
    Orchestrator(String),

    /// Storage or other internal failure.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Stable wire kind for client-side branching.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_error",
            Self::Auth(_) => "auth_error",
            Self::OwnerMismatch => "owner_mismatch",
            Self::NotFound { .. } => "not_found",
            Self::OrchestratorTimeout => "orchestrator_timeout",
            Self::Orchestrator(_) => "orchestrator_error",
            Self::Internal(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::OwnerMismatch => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::OrchestratorTimeout => StatusCode::SERVICE_UNAVAILABLE,
            Self::Orchestrator(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "error": { "kind": self.kind(), "message": self.to_string() }
        }));
        match self {
            // 401s tell the client how to authenticate.
            Self::Auth(_) => (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response(),
            _ => (status, body).into_response(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { what } => Self::NotFound { what },
            other => Self::Internal(other.to_string()),
        }
    }
}

impl From<TurnError> for ApiError {
    fn from(e: TurnError) -> Self {
        if e.is_timeout() {
            Self::OrchestratorTimeout
        } else {
            Self::Orchestrator(e.to_string())
        }
    }
}
