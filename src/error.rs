use serde_json::Value;
use thiserror::Error;

use crate::session::{SessionId, TransportKind};

#[derive(Debug, Error)]
pub enum McpError {
    // Protocol Errors
    #[error("Method not found: {0}")]
    UnknownMethod(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Not initialized")]
    NotInitialized,

    // Resource Errors
    #[error("Tool not found: {0}")]
    UnknownTool(String),

    // JSON Errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Internal Errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl McpError {
    /// Convert to JSON-RPC error code
    pub fn error_code(&self) -> i32 {
        match self {
            Self::UnknownMethod(_) | Self::UnknownTool(_) => -32601,
            Self::InvalidParams(_) => -32602,
            Self::InvalidRequest(_) => -32600,
            Self::Json(_) => -32700,
            Self::NotInitialized => -32002,
            Self::Internal(_) => -32603,
        }
    }

    /// Create JSON-RPC error response
    pub fn to_json_rpc_error(&self, id: Option<Value>) -> Value {
        serde_json::json!({
            "jsonrpc": "2.0",
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            },
            "id": id,
        })
    }
}

// Result type alias for convenience
pub type McpResult<T> = Result<T, McpError>;

/// Addressing and lifecycle failures of the session registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No {kind} transport found for session {id}")]
    NotFound { kind: TransportKind, id: SessionId },

    #[error("Session {id} is already registered for {kind}")]
    Duplicate { kind: TransportKind, id: SessionId },

    #[error("Too many {kind} sessions (max: {max})")]
    TooManySessions { kind: TransportKind, max: usize },
}

/// Failures of the upstream customer-details fetch.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to fetch customer details: {reason}")]
    Upstream {
        status: Option<u16>,
        reason: String,
    },

    #[error("Failed to decode customer details: {0}")]
    Decode(String),
}

impl BridgeError {
    /// HTTP status reported by the upstream, if it answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Upstream { status, .. } => *status,
            Self::Decode(_) => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Session inbound queue is full (capacity: {capacity})")]
    QueueFull { capacity: usize },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
