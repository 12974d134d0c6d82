//! Inbound body validation
//!
//! Size limits and JSON decoding for message bodies, plus the checks the
//! streamable HTTP route needs before it can pick a session.

use {
    crate::protocol::is_initialize_request,
    serde_json::Value,
    thiserror::Error,
    tracing::{trace, warn},
};

#[derive(Debug, Error)]
pub enum PayloadError {
    #[error("Message of {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: usize, limit: u64 },

    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Decode an inbound body, enforcing the configured size limit first
pub fn parse_payload(body: &[u8], limit: u64) -> Result<Value, PayloadError> {
    let size = body.len();
    if size as u64 > limit {
        warn!(size_bytes = size, limit_bytes = limit, "Rejecting oversized message");
        return Err(PayloadError::TooLarge { size, limit });
    }

    let payload: Value = serde_json::from_slice(body)?;
    trace!(
        size_bytes = size,
        batch = payload.is_array(),
        "Decoded inbound payload"
    );
    Ok(payload)
}

/// True for an `initialize` request, alone or inside a batch
pub fn contains_initialize(payload: &Value) -> bool {
    match payload {
        Value::Array(batch) => batch.iter().any(is_initialize_request),
        message => is_initialize_request(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_payload_valid() {
        let body = br#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        let payload = parse_payload(body, 1024).unwrap();
        assert_eq!(payload["method"], "ping");
    }

    #[test]
    fn test_parse_payload_rejects_invalid_json() {
        let result = parse_payload(b"{not json", 1024);
        assert!(matches!(result, Err(PayloadError::InvalidJson(_))));

        let result = parse_payload(b"", 1024);
        assert!(matches!(result, Err(PayloadError::InvalidJson(_))));
    }

    #[test]
    fn test_parse_payload_enforces_limit() {
        let body = vec![b' '; 33];
        let result = parse_payload(&body, 32);
        assert!(matches!(
            result,
            Err(PayloadError::TooLarge { size: 33, limit: 32 })
        ));
    }

    #[test]
    fn test_contains_initialize() {
        let init = json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}});
        let ping = json!({"jsonrpc": "2.0", "id": 2, "method": "ping"});

        assert!(contains_initialize(&init));
        assert!(!contains_initialize(&ping));
        assert!(contains_initialize(&json!([ping.clone(), init])));
        assert!(!contains_initialize(&json!([ping])));
        // A notification named initialize is not a request
        assert!(!contains_initialize(
            &json!({"jsonrpc": "2.0", "method": "initialize"})
        ));
    }
}
