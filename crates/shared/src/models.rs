//! HTTP response types for the proxy's own (non JSON-RPC) endpoints.
//!
//! All response types use `camelCase` field names for the JSON wire format.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Response for the status endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Upstream node URL requests are forwarded to.
    pub upstream: String,
    /// Last irreversible block number seen by the poller (0 until the first poll).
    pub last_irreversible_block_num: u64,
    /// When the poller last stored a value.
    pub updated_at: Option<DateTime<Utc>>,
    /// Names of the configured cache backends, in registration order.
    pub cache_backends: Vec<&'static str>,
    /// Number of loaded ttl rules.
    pub ttl_rules: usize,
}
