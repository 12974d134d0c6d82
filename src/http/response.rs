//! HTTP Response Building
//!
//! Helpers for the gateway's JSON, plain-text and empty responses.

use {
    crate::error::SessionError,
    crate::session::SessionId,
    serde_json::{json, Value},
    tracing::debug,
    warp::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    warp::reply::{self, Response},
    warp::Reply,
};

pub const MCP_SESSION_ID_HEADER: &str = "mcp-session-id";

/// Body of the 400 returned by `/messages` for an unresolvable session
pub const NO_TRANSPORT_FOUND: &str = "No transport found for sessionId";

pub const INVALID_OR_MISSING_SESSION: &str = "Invalid or missing session ID";

/// Builder for HTTP responses
#[derive(Debug)]
pub struct ResponseBuilder {
    status: StatusCode,
    headers: HeaderMap,
}

impl ResponseBuilder {
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Echo the session id to streamable HTTP clients
    pub fn with_session(self, session_id: &SessionId) -> Self {
        self.with_header(MCP_SESSION_ID_HEADER, session_id.as_str())
    }

    /// Add a custom header; invalid names or values are skipped
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn json(self, body: &Value) -> Response {
        self.finish(reply::json(body).into_response())
    }

    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(body.into().into_response())
    }

    pub fn empty(self) -> Response {
        self.finish(reply::reply().into_response())
    }

    fn finish(self, mut response: Response) -> Response {
        *response.status_mut() = self.status;
        let headers = response.headers_mut();
        for (name, value) in self.headers {
            if let Some(name) = name {
                headers.insert(name, value);
            }
        }

        debug!(status = %self.status, "Built response");
        response
    }
}

impl Default for ResponseBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn text_response(status: StatusCode, body: impl Into<String>) -> Response {
    ResponseBuilder::new().with_status(status).text(body)
}

/// JSON-RPC error envelope outside any request context
pub fn json_rpc_error_response(status: StatusCode, code: i32, message: &str) -> Response {
    ResponseBuilder::new().with_status(status).json(&json!({
        "jsonrpc": "2.0",
        "error": {
            "code": code,
            "message": message
        },
        "id": null
    }))
}

/// 400 for a streamable HTTP POST with no usable session
pub fn no_valid_session_response() -> Response {
    json_rpc_error_response(
        StatusCode::BAD_REQUEST,
        -32000,
        "Bad Request: No valid session ID provided",
    )
}

/// Map a failed session registration to an HTTP status
pub fn session_error_response(error: &SessionError) -> Response {
    let status = match error {
        SessionError::TooManySessions { .. } => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::NotFound { .. } => StatusCode::BAD_REQUEST,
        SessionError::Duplicate { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    text_response(status, error.to_string())
}

pub fn method_not_allowed(allow: &str) -> Response {
    ResponseBuilder::new()
        .with_status(StatusCode::METHOD_NOT_ALLOWED)
        .with_header(header::ALLOW.as_str(), allow)
        .text("Method Not Allowed")
}
