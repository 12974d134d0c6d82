//! Gateway Logging Module
//!
//! Structured logging for the gateway using the tracing crate.
//! Session lifecycle and routing events carry an `event` field so they can be
//! filtered in JSON output.

use {
    crate::session::{SessionId, TransportKind},
    std::sync::atomic::{AtomicU64, Ordering},
    std::time::{Duration, SystemTime, UNIX_EPOCH},
    tracing::{debug, info, span, warn, Level, Span},
    tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter},
};

/// Initialize the tracing subscriber with appropriate configuration
pub fn init_tracing() {
    // Try to get log level from environment, default to info
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("gatewaymcp=info,warp=info"));

    // Check if JSON format is requested
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if json_format {
        // JSON format for production/structured logging
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    } else {
        // Human-readable format for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();
    }

    info!("Tracing initialized");
}

static REQUEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a unique request ID for tracking
pub fn generate_request_id() -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;

    let counter = REQUEST_COUNTER.fetch_add(1, Ordering::Relaxed);

    format!("{:x}-{:04x}", timestamp, counter % 0x10000)
}

/// Span covering the lifetime of one session
pub fn session_span(kind: TransportKind, session_id: &SessionId) -> Span {
    span!(
        Level::INFO,
        "mcp_session",
        transport = %kind,
        session_id = %session_id,
    )
}

/// Span covering one inbound HTTP request
pub fn request_span(route: &str, request_id: &str, session_id: Option<&str>) -> Span {
    span!(
        Level::DEBUG,
        "gateway_request",
        route = %route,
        request_id = %request_id,
        session_id = session_id,
    )
}

/// Session lifecycle
pub fn log_session_opened(kind: TransportKind, session_id: &SessionId) {
    info!(
        transport = %kind,
        session_id = %session_id,
        event = "session_opened",
        "Session opened"
    );
}

pub fn log_session_closed(kind: TransportKind, session_id: &SessionId, lifetime: Duration) {
    info!(
        transport = %kind,
        session_id = %session_id,
        lifetime_ms = lifetime.as_millis(),
        event = "session_closed",
        "Session closed"
    );
}

pub fn log_session_lookup_failed(kind: TransportKind, session_id: &str) {
    warn!(
        transport = %kind,
        session_id = %session_id,
        event = "session_lookup_failed",
        "No transport found for session"
    );
}

pub fn log_message_forwarded(kind: TransportKind, session_id: &SessionId, size: usize) {
    debug!(
        transport = %kind,
        session_id = %session_id,
        message_size = size,
        event = "message_forwarded",
        "Forwarded inbound message"
    );
}

pub fn log_reply_discarded(kind: TransportKind, session_id: &SessionId) {
    debug!(
        transport = %kind,
        session_id = %session_id,
        event = "reply_discarded",
        "Session closed before reply could be delivered"
    );
}

/// Tool events
pub fn log_tool_call(tool: &str, args: &serde_json::Value) {
    info!(
        tool = %tool,
        args = ?args,
        event = "tool_call",
        "Tool call requested"
    );
}

pub fn log_upstream_error(url: &str, status: Option<u16>, error: &str) {
    warn!(
        url = %url,
        status = ?status,
        error = %error,
        event = "upstream_error",
        "Upstream request failed"
    );
}

/// Server lifecycle logging
pub fn log_server_startup(port: u16) {
    info!(port = port, event = "server_startup", "Starting MCP gateway");
}

pub fn log_server_ready(addr: &str) {
    info!(
        address = %addr,
        event = "server_ready",
        "MCP gateway ready and listening"
    );
}

pub fn log_server_shutdown(closed_sessions: usize) {
    info!(
        closed_sessions = closed_sessions,
        event = "server_shutdown",
        "MCP gateway shutting down"
    );
}
