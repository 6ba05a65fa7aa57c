//! Reconciles a cached response with the request currently being served.

use serde_json::Value;

use crate::jsonrpc::JsonRpcRequest;

/// Replaces the cached response's `id` with the live request's id.
///
/// JSON-RPC ids are per call, so whatever id was stored with the cached value is
/// discarded: it is overwritten when the request has one, and removed for
/// notification-style requests without an id.
pub fn merge_cached_response(mut cached: Value, request: &JsonRpcRequest) -> Value {
    if let Some(obj) = cached.as_object_mut() {
        match &request.id {
            Some(id) => {
                obj.insert("id".to_string(), id.clone());
            }
            None => {
                obj.remove("id");
            }
        }
    }
    cached
}
