//! Health check functionality for the gateway
//!
//! Backs `GET /health`: liveness plus the number of live sessions per
//! transport kind.

use {
    crate::protocol::LATEST_PROTOCOL_VERSION,
    crate::session::{SessionRegistries, TransportKind},
    serde::{Deserialize, Serialize},
    std::time::{SystemTime, UNIX_EPOCH},
};

/// Health check response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always "healthy" if responding
    pub status: String,

    /// Seconds since Unix epoch
    pub timestamp: u64,

    pub version: String,

    /// Live sessions across both transports
    pub session_count: usize,

    pub uptime_seconds: u64,

    pub metadata: HealthMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetadata {
    pub server_name: String,
    pub protocol_version: String,
    pub sse_sessions: usize,
    pub streamable_sessions: usize,
}

#[derive(Debug, Clone)]
pub struct HealthChecker {
    start_time: SystemTime,
    version: String,
    server_name: String,
}

impl HealthChecker {
    pub fn new(server_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            start_time: SystemTime::now(),
            version: version.into(),
            server_name: server_name.into(),
        }
    }

    /// Snapshot of the gateway's health
    pub fn get_status(&self, registries: &SessionRegistries) -> HealthStatus {
        let now = SystemTime::now();
        let timestamp = now.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs();
        let uptime_seconds = now
            .duration_since(self.start_time)
            .unwrap_or_default()
            .as_secs();

        let sse_sessions = registries.for_kind(TransportKind::Sse).len();
        let streamable_sessions = registries.for_kind(TransportKind::Streaming).len();

        HealthStatus {
            status: "healthy".to_string(),
            timestamp,
            version: self.version.clone(),
            session_count: sse_sessions + streamable_sessions,
            uptime_seconds,
            metadata: HealthMetadata {
                server_name: self.server_name.clone(),
                protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
                sse_sessions,
                streamable_sessions,
            },
        }
    }

    pub fn get_json_status(&self, registries: &SessionRegistries) -> serde_json::Value {
        serde_json::to_value(self.get_status(registries)).unwrap_or_else(|_| {
            serde_json::json!({
                "status": "error",
                "message": "Failed to serialize health status"
            })
        })
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new("mcp-sse-server", env!("CARGO_PKG_VERSION"))
    }
}
