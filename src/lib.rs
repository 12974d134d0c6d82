//! MCP Gateway Library
//!
//! A minimal Model Context Protocol gateway exposing a customer details
//! lookup tool over two transports: Streamable HTTP on `/mcp` and the legacy
//! SSE pair `GET /sse` + `POST /messages`.

pub mod bridge;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod health;
pub mod http;
pub mod limits;
pub mod logging;
pub mod protocol;
pub mod server;
pub mod session;
pub mod tools;
pub mod transport;

// Test modules
#[cfg(test)]
pub mod tests;

// Re-export key types
pub use bridge::CustomerDetailsClient;
pub use config::{GatewayConfig, UpstreamConfig};
pub use engine::{McpProtocolEngine, McpSession};
pub use error::{BridgeError, ConfigError, McpError, McpResult, SessionError, TransportError};
pub use handler::{McpContext, McpHandler, ToolDefinition};
pub use health::{HealthChecker, HealthStatus};
pub use limits::ResourceLimits;
pub use protocol::McpProtocol;
pub use server::{GatewayServer, RunningServer};
pub use session::{SessionId, SessionRegistries, SessionRegistry, TransportKind};
pub use tools::CustomerTools;
pub use transport::{InboundAck, SseTransport, StreamableHttpTransport, TransportAdapter};
