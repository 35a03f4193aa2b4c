//! Error types for the taskmind domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; the gateway maps them to
//! HTTP statuses and stable wire kinds.

use thiserror::Error;

/// The top-level error type for all taskmind operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Store errors ---
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    // --- Tool errors ---
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Failures of the reasoning provider call.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of durable storage (conversations, messages, tasks).
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Failures of a single tool invocation.
///
/// `UnknownTool` and `InvalidArguments` are protocol-level: the reasoning
/// provider asked for something outside the closed catalog. The remaining
/// variants are execution failures from the task store. Every variant is fed
/// back into the loop as a structured tool result; none aborts the turn.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Invalid tool arguments: {reason}")]
    InvalidArguments { reason: String },

    #[error("{what} not found")]
    NotFound { what: String },

    #[error("Tool timed out: {tool_name} after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ToolError {
    /// Stable wire kind carried in structured failure payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownTool { .. } | Self::InvalidArguments { .. } => "protocol_error",
            Self::NotFound { .. } | Self::Store(StoreError::NotFound { .. }) => "not_found",
            Self::Timeout { .. } => "timeout",
            Self::Store(_) => "store_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn store_not_found_names_the_entity() {
        let err = StoreError::NotFound {
            what: "task 999".into(),
        };
        assert_eq!(err.to_string(), "task 999 not found");
    }

    #[test]
    fn tool_error_kinds_are_stable() {
        let unknown = ToolError::UnknownTool {
            name: "send_email".into(),
        };
        assert_eq!(unknown.kind(), "protocol_error");

        let bad_args = ToolError::InvalidArguments {
            reason: "missing field `title`".into(),
        };
        assert_eq!(bad_args.kind(), "protocol_error");

        let missing = ToolError::NotFound {
            what: "task 7".into(),
        };
        assert_eq!(missing.kind(), "not_found");

        let timed_out = ToolError::Timeout {
            tool_name: "list_tasks".into(),
            timeout_secs: 5,
        };
        assert_eq!(timed_out.kind(), "timeout");
    }

    #[test]
    fn store_not_found_keeps_not_found_kind_when_wrapped() {
        let err = ToolError::Store(StoreError::NotFound {
            what: "task 3".into(),
        });
        assert_eq!(err.kind(), "not_found");

        let err = ToolError::Store(StoreError::Database("disk I/O error".into()));
        assert_eq!(err.kind(), "store_error");
    }
}
