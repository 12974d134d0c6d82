//! JSON-RPC message classification and typed parameters
//!
//! Payloads stay as `serde_json::Value` on the transport side; this module
//! decides what kind of message a payload is and decodes the parameters of
//! the few methods the gateway answers.

use {
    crate::error::{McpError, McpResult},
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

/// Initialize method parameters
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub capabilities: Value,
    pub client_info: Option<Value>,
}

/// Tool call parameters
#[derive(Debug, Deserialize, Serialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// What an inbound payload turned out to be
#[derive(Debug, PartialEq)]
pub enum MessageKind<'a> {
    /// Has `method` and `id`; expects a reply
    Request {
        id: &'a Value,
        method: &'a str,
        params: Option<&'a Value>,
    },
    /// Has `method` but no `id`
    Notification {
        method: &'a str,
        params: Option<&'a Value>,
    },
    /// A client reply to a server-initiated request
    Response,
}

impl<'a> MessageKind<'a> {
    /// Classify a single JSON-RPC message
    pub fn classify(message: &'a Value) -> McpResult<Self> {
        let object = message
            .as_object()
            .ok_or_else(|| McpError::InvalidRequest("Message must be a JSON object".into()))?;

        match object.get("jsonrpc").and_then(Value::as_str) {
            Some("2.0") => {}
            Some(other) => {
                return Err(McpError::InvalidRequest(format!(
                    "Invalid jsonrpc version: {other}"
                )))
            }
            None => {
                return Err(McpError::InvalidRequest(
                    "Missing or invalid 'jsonrpc' field".into(),
                ))
            }
        }

        let params = object.get("params");
        match (object.get("method"), object.get("id")) {
            (Some(Value::String(method)), Some(id)) if !method.is_empty() => Ok(Self::Request {
                id,
                method,
                params,
            }),
            (Some(Value::String(method)), None) if !method.is_empty() => {
                Ok(Self::Notification { method, params })
            }
            (Some(_), _) => Err(McpError::InvalidRequest(
                "Missing or invalid 'method' field".into(),
            )),
            (None, Some(_)) if object.contains_key("result") || object.contains_key("error") => {
                Ok(Self::Response)
            }
            (None, _) => Err(McpError::InvalidRequest(
                "Message has neither 'method' nor 'result'".into(),
            )),
        }
    }

    pub fn method(&self) -> Option<&'a str> {
        match self {
            Self::Request { method, .. } | Self::Notification { method, .. } => Some(*method),
            Self::Response => None,
        }
    }
}

/// True when the payload is a single `initialize` request
pub fn is_initialize_request(message: &Value) -> bool {
    matches!(
        MessageKind::classify(message),
        Ok(MessageKind::Request {
            method: "initialize",
            ..
        })
    )
}

/// Decode method parameters, treating absent params as `{}`
pub fn parse_params<T>(params: Option<&Value>) -> McpResult<T>
where
    T: for<'de> Deserialize<'de>,
{
    let params = params.cloned().unwrap_or_else(|| Value::Object(Default::default()));
    serde_json::from_value(params).map_err(|e| McpError::InvalidParams(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_request() {
        let msg = json!({"jsonrpc": "2.0", "id": 1, "method": "tools/list"});
        match MessageKind::classify(&msg).unwrap() {
            MessageKind::Request { id, method, params } => {
                assert_eq!(id, &json!(1));
                assert_eq!(method, "tools/list");
                assert!(params.is_none());
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_classify_notification_and_response() {
        let note = json!({"jsonrpc": "2.0", "method": "notifications/initialized"});
        assert_eq!(
            MessageKind::classify(&note).unwrap().method(),
            Some("notifications/initialized")
        );

        let reply = json!({"jsonrpc": "2.0", "id": 3, "result": {}});
        assert_eq!(MessageKind::classify(&reply).unwrap(), MessageKind::Response);
    }

    #[test]
    fn test_classify_rejects_malformed() {
        assert!(MessageKind::classify(&json!([1, 2])).is_err());
        assert!(MessageKind::classify(&json!({"jsonrpc": "1.0", "method": "x"})).is_err());
        assert!(MessageKind::classify(&json!({"jsonrpc": "2.0", "id": 1})).is_err());
        assert!(MessageKind::classify(&json!({"jsonrpc": "2.0", "method": 5})).is_err());
    }

    #[test]
    fn test_is_initialize_request() {
        let init = json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {}});
        assert!(is_initialize_request(&init));

        let note = json!({"jsonrpc": "2.0", "method": "initialize"});
        assert!(!is_initialize_request(&note));
        assert!(!is_initialize_request(&json!([init])));
    }

    #[test]
    fn test_parse_tool_call_params() {
        let params = json!({"name": "get-customer-details", "arguments": {"customerNo": "1"}});
        let parsed: ToolCallParams = parse_params(Some(&params)).unwrap();
        assert_eq!(parsed.name, "get-customer-details");
        assert_eq!(parsed.arguments.unwrap()["customerNo"], "1");

        let err = parse_params::<ToolCallParams>(None).unwrap_err();
        assert_eq!(err.error_code(), -32602);
    }
}
