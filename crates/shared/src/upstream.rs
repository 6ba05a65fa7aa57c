//! HTTP client for the blockchain node behind the proxy.
//!
//! A single `reqwest::Client` is reused for connection pooling. The same client serves
//! proxied JSON-RPC calls and the irreversible-block poller.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AppError;
use crate::jsonrpc::{is_error_response, JsonRpcRequest, JSONRPC_VERSION};

/// Fields of `get_dynamic_global_properties` the proxy cares about.
#[derive(Debug, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: Option<u64>,
    pub last_irreversible_block_num: u64,
}

/// JSON-RPC client for the upstream node.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client,
    url: String,
}

impl UpstreamClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Forwards a single JSON-RPC request and returns the node's response body.
    ///
    /// JSON-RPC level errors are returned as `Ok` responses carrying an `error` member;
    /// only transport and HTTP failures become `Err`.
    pub async fn call(&self, request: &JsonRpcRequest) -> Result<Value, AppError> {
        let resp = self.client.post(&self.url).json(request).send().await?;

        if !resp.status().is_success() {
            return Err(AppError::UpstreamStatus(resp.status().as_u16()));
        }

        let body = resp.json::<Value>().await?;
        if !body.is_object() {
            return Err(AppError::Upstream(format!(
                "expected a JSON-RPC response object, got {body}"
            )));
        }
        Ok(body)
    }

    /// Fetches `get_dynamic_global_properties`, which carries the last irreversible block.
    pub async fn fetch_dynamic_global_properties(
        &self,
    ) -> Result<DynamicGlobalProperties, AppError> {
        let request = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: Some(json!(1)),
            method: "get_dynamic_global_properties".to_string(),
            params: Some(json!([])),
        };
        let body = self.call(&request).await?;

        if is_error_response(&body) {
            return Err(AppError::Upstream(format!(
                "get_dynamic_global_properties failed: {}",
                body["error"]
            )));
        }

        let result = body.get("result").cloned().unwrap_or(Value::Null);
        serde_json::from_value(result).map_err(|e| AppError::Upstream(e.to_string()))
    }
}
