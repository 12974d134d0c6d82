//! MCP protocol framing
//!
//! Protocol versioning, server identity and JSON-RPC envelope construction.

pub mod message;

pub use message::{
    is_initialize_request, InitializeParams, MessageKind, ToolCallParams,
};

// Re-export the main protocol struct
pub use self::protocol::{McpProtocol, LATEST_PROTOCOL_VERSION, SUPPORTED_PROTOCOL_VERSIONS};

mod protocol {
    use {
        serde_json::{json, Value},
        tracing::debug,
    };

    pub const LATEST_PROTOCOL_VERSION: &str = "2025-06-18";

    pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2024-11-05", "2025-03-26", "2025-06-18"];

    pub struct McpProtocol {
        server_name: String,
        server_version: String,
    }

    impl McpProtocol {
        pub fn new() -> Self {
            Self {
                server_name: "mcp-sse-server".to_string(),
                server_version: env!("CARGO_PKG_VERSION").to_string(),
            }
        }

        /// Get server name
        pub fn server_name(&self) -> &str {
            &self.server_name
        }

        /// Get server version
        pub fn server_version(&self) -> &str {
            &self.server_version
        }

        /// Pick the version to answer an initialize request with: the client's
        /// own if supported, otherwise the latest this server speaks.
        pub fn negotiate_version(&self, requested: Option<&str>) -> &'static str {
            match requested {
                Some(requested) => SUPPORTED_PROTOCOL_VERSIONS
                    .iter()
                    .copied()
                    .find(|v| *v == requested)
                    .unwrap_or_else(|| {
                        debug!(
                            requested = %requested,
                            answered = LATEST_PROTOCOL_VERSION,
                            "Client requested unsupported protocol version"
                        );
                        LATEST_PROTOCOL_VERSION
                    }),
                None => LATEST_PROTOCOL_VERSION,
            }
        }

        /// Create initialization result
        pub fn create_initialize_result(&self, protocol_version: &str) -> Value {
            json!({
                "protocolVersion": protocol_version,
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    }
                },
                "serverInfo": {
                    "name": self.server_name,
                    "version": self.server_version
                }
            })
        }

        /// Create success response
        pub fn create_success_response(&self, id: Value, result: Value) -> Value {
            json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result
            })
        }
    }

    impl Default for McpProtocol {
        fn default() -> Self {
            Self::new()
        }
    }

}
