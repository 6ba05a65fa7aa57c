//! JSON-RPC proxy endpoint.
//!
//! Accepts a single request object or a batch array. Every call goes through the cache
//! orchestrator with the upstream node as the delegate, so cache hits never reach the
//! node. Batch responses keep request order.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::future::join_all;
use serde_json::Value;

use rpcache_shared::error::AppError;
use rpcache_shared::jsonrpc::{error_response, JsonRpcRequest, PARSE_ERROR};

use crate::state::AppState;

/// Proxies a JSON-RPC request or batch, serving cacheable calls from the cache.
pub async fn handle_jsonrpc(State(state): State<AppState>, body: Bytes) -> Response {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(error_response(None, PARSE_ERROR, format!("parse error: {e}"))),
            )
                .into_response();
        }
    };

    match payload {
        Value::Array(items) if items.is_empty() => {
            AppError::InvalidRequest("empty batch".into()).into_response()
        }
        Value::Array(items) => {
            let state = &state;
            let responses = join_all(items.into_iter().map(|item| async move {
                match dispatch(state, item).await {
                    Ok(response) => response,
                    Err((err, id)) => err.to_jsonrpc(id.as_ref()),
                }
            }))
            .await;
            Json(Value::Array(responses)).into_response()
        }
        item => match dispatch(&state, item).await {
            Ok(response) => Json(response).into_response(),
            Err((err, id)) => (err.status(), Json(err.to_jsonrpc(id.as_ref()))).into_response(),
        },
    }
}

/// Runs one call through the cache. Errors carry the request id for the error object.
async fn dispatch(state: &AppState, item: Value) -> Result<Value, (AppError, Option<Value>)> {
    let id = item.get("id").cloned();
    let request: JsonRpcRequest = serde_json::from_value(item)
        .map_err(|e| (AppError::InvalidRequest(e.to_string()), id))?;

    state
        .cache
        .cacher(&request, || state.upstream.call(&request))
        .await
        .map_err(|e| {
            tracing::error!(
                method = %request.method,
                error = %e,
                "upstream call failed"
            );
            (e, request.id.clone())
        })
}
