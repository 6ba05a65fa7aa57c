//! Shared application state for the axum server.
//!
//! Holds the cache context (rule table, backends, irreversible-block tracker) and the
//! upstream node client. Both are cheap to clone and shared by every request.

use rpcache_cache::context::CacheContext;
use rpcache_shared::upstream::UpstreamClient;

/// Shared state passed to all axum handlers via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub cache: CacheContext,
    pub upstream: UpstreamClient,
}
