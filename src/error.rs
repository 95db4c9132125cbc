//! Error types for the relay: client-side failures plus JSON-RPC errors
//! reported by the remote agent.
//!
//! Nothing in this crate retries. Every failure surfaces to whoever called
//! [`MessageRelay::send`](crate::client::MessageRelay::send) as one of the
//! variants below.

use crate::types::JsonRpcError;

// ---------------------------------------------------------------------------
// JSON-RPC 2.0 error codes
// ---------------------------------------------------------------------------

/// Invalid JSON was received.
pub const PARSE_ERROR: i64 = -32700;

/// Internal JSON-RPC error. Client-side failures map here.
pub const INTERNAL_ERROR: i64 = -32603;

/// The requested operation is not supported by the agent.
pub const UNSUPPORTED_OPERATION: i64 = -32004;

// ---------------------------------------------------------------------------
// A2uiError enum
// ---------------------------------------------------------------------------

/// Unified error type for discovery, transport and streaming failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum A2uiError {
    /// The relay configuration is unusable (bad base URL, bad header).
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The discovery document was fetched but does not describe a usable
    /// endpoint.
    #[error("Discovery failed: {0}")]
    Discovery(String),

    /// The agent card declares that it cannot stream responses.
    #[error("Streaming not supported: {0}")]
    StreamingNotSupported(String),

    /// Transport-level error (connection failed, body read failed, etc.).
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Non-2xx HTTP response.
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// Malformed JSON from the remote side (discovery document or stream event).
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// The agent answered with a JSON-RPC error object.
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message.
        message: String,
        /// Optional structured error data.
        data: Option<serde_json::Value>,
    },
}

/// Convenience result type for relay operations.
pub type A2uiResult<T> = Result<T, A2uiError>;

impl A2uiError {
    /// Returns the JSON-RPC error code for this error.
    ///
    /// Errors received from the agent keep their code; everything raised on
    /// the client side maps to -32603, except malformed JSON (-32700) and a
    /// missing streaming capability (-32004).
    pub fn code(&self) -> i64 {
        match self {
            A2uiError::JsonRpc { code, .. } => *code,
            A2uiError::InvalidJson(_) => PARSE_ERROR,
            A2uiError::StreamingNotSupported(_) => UNSUPPORTED_OPERATION,
            A2uiError::Config(_)
            | A2uiError::Discovery(_)
            | A2uiError::Transport(_)
            | A2uiError::Timeout(_)
            | A2uiError::Http { .. } => INTERNAL_ERROR,
        }
    }

    /// Whether the failure looks transient (connection, timeout, 5xx, 429).
    ///
    /// Purely informational for callers; the relay never retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            A2uiError::Transport(_) | A2uiError::Timeout(_) => true,
            A2uiError::Http { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Map a `reqwest` error onto the transport-side variants.
    #[cfg(feature = "client")]
    pub(crate) fn from_reqwest(err: reqwest::Error, context: &str) -> Self {
        if err.is_timeout() {
            A2uiError::Timeout(format!("{context} timed out: {err}"))
        } else if err.is_connect() {
            A2uiError::Transport(format!("{context}: connection failed: {err}"))
        } else {
            A2uiError::Transport(format!("{context} failed: {err}"))
        }
    }
}

impl From<JsonRpcError> for A2uiError {
    fn from(err: JsonRpcError) -> Self {
        A2uiError::JsonRpc {
            code: err.code,
            message: err.message,
            data: err.data,
        }
    }
}

impl From<serde_json::Error> for A2uiError {
    fn from(err: serde_json::Error) -> Self {
        A2uiError::InvalidJson(err.to_string())
    }
}
