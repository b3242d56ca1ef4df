//! JSON-RPC 2.0 message types.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Standard JSON-RPC / LSP error codes.
pub mod error_codes {
    /// Invalid request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Unknown method
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Bad parameters
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal server error
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Request received before `initialize`
    pub const SERVER_NOT_INITIALIZED: i32 = -32002;
    /// Request was cancelled via `$/cancelRequest`
    pub const REQUEST_CANCELLED: i32 = -32800;
}

/// An incoming request or notification. `id` is `None` for notifications.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// Protocol version, always "2.0"
    #[serde(rename = "jsonrpc", default)]
    pub _jsonrpc: String,
    /// Request id; absent for notifications
    #[serde(default)]
    pub id: Option<Value>,
    /// Method name
    pub method: String,
    /// Method parameters
    #[serde(default)]
    pub params: Option<Value>,
}

/// An outgoing response. Exactly one of `result`/`error` is set.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// Protocol version, always "2.0"
    pub jsonrpc: String,
    /// Id of the request being answered
    pub id: Option<Value>,
    /// Success payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Failure payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// A success response.
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: Some(result), error: None }
    }

    /// An error response.
    pub fn error(id: Option<Value>, error: JsonRpcError) -> Self {
        Self { jsonrpc: "2.0".to_string(), id, result: None, error: Some(error) }
    }

    /// A `null` result, for methods that return nothing.
    pub fn null(id: Option<Value>) -> Self {
        Self::success(id, Value::Null)
    }
}

/// A JSON-RPC error object.
#[derive(Debug, Clone, Serialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,
    /// Human-readable message
    pub message: String,
    /// Optional structured data
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Create an error.
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into(), data: None }
    }

    /// An unknown-method error.
    pub fn method_not_found(method: &str) -> Self {
        Self::new(error_codes::METHOD_NOT_FOUND, format!("method not found: {method}"))
    }

    /// A bad-parameters error.
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(error_codes::INVALID_PARAMS, detail)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for JsonRpcError {}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn notification_has_no_id() {
        let parsed: JsonRpcRequest = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "initialized",
            "params": {}
        }))
        .unwrap_or_else(|_| JsonRpcRequest {
            _jsonrpc: String::new(),
            id: None,
            method: String::new(),
            params: None,
        });
        assert_eq!(parsed.method, "initialized");
        assert_eq!(parsed.id, None);
    }

    #[test]
    fn responses_serialize_one_arm() {
        let success = JsonRpcResponse::success(Some(json!(1)), json!({"ok": true}));
        let value = serde_json::to_value(&success).unwrap_or_default();
        assert_eq!(value.get("error"), None);
        assert_eq!(value.get("result"), Some(&json!({"ok": true})));

        let failure = JsonRpcResponse::error(Some(json!(2)), JsonRpcError::method_not_found("x"));
        let value = serde_json::to_value(&failure).unwrap_or_default();
        assert_eq!(value.get("result"), None);
        assert_eq!(
            value.pointer("/error/code"),
            Some(&json!(error_codes::METHOD_NOT_FOUND))
        );
    }
}
