//! Error types for configuration, block-id resolution and upstream calls.
//!
//! Only [`ConfigError`] is ever fatal (at startup). [`BlockIdError`] degrades to "don't
//! cache", and [`AppError`] is rendered as a JSON-RPC error object for the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::Value;

use crate::jsonrpc::{self, INTERNAL_ERROR, INVALID_REQUEST};

/// Startup configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value {value:?} for {var}")]
    InvalidVar { var: &'static str, value: String },

    #[error("invalid ttl {0}: expected a positive number of seconds, 0, -1 or -2")]
    InvalidTtl(i64),

    #[error("ttl rule prefix must not be empty")]
    EmptyPrefix,

    #[error("failed to read ttl rules: {0}")]
    RulesRead(#[from] std::io::Error),

    #[error("failed to parse ttl rules: {0}")]
    RulesParse(#[from] serde_json::Error),
}

/// Reasons a block number could not be extracted from a response.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BlockIdError {
    #[error("response is a JSON-RPC error")]
    ErrorResponse,

    #[error("response has no result.block_id")]
    Missing,

    #[error("result.block_id is not a string")]
    NotAString,

    #[error("result.block_id {0:?} does not start with a hex block number")]
    Malformed(String),
}

/// Failures talking to the upstream node, or requests the proxy refuses outright.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("upstream error: {0}")]
    Upstream(String),

    #[error("upstream returned HTTP {0}")]
    UpstreamStatus(u16),
}

impl AppError {
    /// Returns the JSON-RPC error code for this error.
    pub fn code(&self) -> i64 {
        match self {
            Self::InvalidRequest(_) => INVALID_REQUEST,
            Self::Upstream(_) | Self::UpstreamStatus(_) => INTERNAL_ERROR,
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::Upstream(_) | Self::UpstreamStatus(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Renders this error as a JSON-RPC error response for the given request id.
    pub fn to_jsonrpc(&self, id: Option<&Value>) -> Value {
        jsonrpc::error_response(id, self.code(), self.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        Self::Upstream(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, axum::Json(self.to_jsonrpc(None))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use axum::response::IntoResponse;
    use serde_json::json;

    use super::*;

    #[test]
    fn code_returns_jsonrpc_code() {
        assert_eq!(AppError::InvalidRequest("x".into()).code(), -32600);
        assert_eq!(AppError::Upstream("x".into()).code(), -32603);
        assert_eq!(AppError::UpstreamStatus(500).code(), -32603);
    }

    #[test]
    fn status_returns_correct_http_status() {
        assert_eq!(
            AppError::InvalidRequest("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Upstream("x".into()).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::UpstreamStatus(503).status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn to_jsonrpc_carries_request_id() {
        let body = AppError::UpstreamStatus(503).to_jsonrpc(Some(&json!(9)));
        assert_eq!(body["id"], 9);
        assert_eq!(body["error"]["code"], -32603);
        assert_eq!(body["error"]["message"], "upstream returned HTTP 503");
    }

    #[tokio::test]
    async fn into_response_produces_jsonrpc_error() {
        let err = AppError::InvalidRequest("expected an object".into());
        let expected_status = err.status();
        let response = err.into_response();

        assert_eq!(response.status(), expected_status);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();

        assert_eq!(json["jsonrpc"], "2.0");
        assert!(json["id"].is_null());
        assert_eq!(json["error"]["code"], -32600);
        assert_eq!(
            json["error"]["message"],
            "invalid request: expected an object"
        );
    }
}
