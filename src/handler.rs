//! MCP Handler Trait
//!
//! The seam between the protocol engine and the tools it exposes. The engine
//! owns session and protocol state; a handler only lists and runs tools.

use {
    crate::error::McpResult,
    crate::session::{SessionId, TransportKind},
    async_trait::async_trait,
    serde_json::{json, Value},
};

/// Context provided to MCP handler methods
#[derive(Debug, Clone)]
pub struct McpContext {
    /// Session the call arrived on
    pub session_id: SessionId,
    /// Transport the session is bound to
    pub transport: TransportKind,
    /// Protocol version negotiated with client
    pub protocol_version: Option<String>,
    /// Client information from initialization
    pub client_info: Option<Value>,
}

/// Tool definition for MCP tools/list response
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema,
        })
    }
}

#[async_trait]
pub trait McpHandler: Send + Sync {
    /// List available tools
    /// Called when a client sends a tools/list request
    async fn list_tools(&self, context: &McpContext) -> McpResult<Vec<ToolDefinition>>;

    /// Execute a tool and return its result envelope
    /// Called when a client sends a tools/call request
    async fn call_tool(&self, name: &str, arguments: Value, context: &McpContext)
        -> McpResult<Value>;
}
