//! JSON-RPC 2.0 request and response shapes as seen by the proxy.
//!
//! Requests are strongly typed because the cache key and TTL policy depend on `method`,
//! `params` and `id`. Responses stay as raw `serde_json::Value` since they are opaque
//! payloads that are cached and replayed verbatim (apart from `id`).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes used by the proxy itself.
pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const INTERNAL_ERROR: i64 = -32603;

/// A single JSON-RPC call.
///
/// `id` distinguishes "absent" (`None`, a notification) from an explicit `null`
/// (`Some(Value::Null)`), which matters when merging cached responses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default = "default_version")]
    pub jsonrpc: String,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

fn default_version() -> String {
    JSONRPC_VERSION.to_string()
}

/// Keeps an explicit `null` as `Some(Value::Null)` instead of collapsing it to `None`.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    pub fn new(id: impl Into<Value>, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: default_version(),
            id: Some(id.into()),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// Returns true if the response carries a JSON-RPC `error` member.
pub fn is_error_response(response: &Value) -> bool {
    response.get("error").is_some()
}

/// Builds a JSON-RPC error response object for the given request id.
pub fn error_response(id: Option<&Value>, code: i64, message: impl Into<String>) -> Value {
    json!({
        "jsonrpc": JSONRPC_VERSION,
        "id": id.cloned().unwrap_or(Value::Null),
        "error": {
            "code": code,
            "message": message.into(),
        }
    })
}
