//! Cache status endpoint.
//!
//! Reports the irreversible block height the cache policy is currently using, along with
//! the configured backends and rule count.

use axum::extract::State;
use axum::Json;

use rpcache_shared::models::StatusResponse;

use crate::state::AppState;

/// Returns the cache policy state.
pub async fn cache_status(State(state): State<AppState>) -> Json<StatusResponse> {
    let tracker = state.cache.last_irreversible();

    Json(StatusResponse {
        upstream: state.upstream.url().to_string(),
        last_irreversible_block_num: tracker.get(),
        updated_at: tracker.updated_at(),
        cache_backends: state.cache.backends().iter().map(|b| b.name()).collect(),
        ttl_rules: state.cache.rules().len(),
    })
}
