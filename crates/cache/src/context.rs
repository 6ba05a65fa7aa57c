//! The cache orchestrator: read, delegate on a miss, schedule writes.

use std::future::Future;
use std::sync::Arc;

use rpcache_shared::irreversible::IrreversibleBlock;
use rpcache_shared::jsonrpc::JsonRpcRequest;
use rpcache_shared::merge::merge_cached_response;
use rpcache_shared::ttl::TtlRuleTable;
use rpcache_shared::urn::method_urn;
use serde_json::Value;

use crate::backend::SharedBackend;
use crate::reader;
use crate::writer::{self, WritePolicy};

/// Everything a request flow needs for caching, built once at startup.
///
/// Cheap to clone; all clones share the same rule table, backends and
/// irreversible-block tracker.
#[derive(Clone)]
pub struct CacheContext {
    rules: Arc<TtlRuleTable>,
    backends: Arc<[SharedBackend]>,
    last_irreversible: Arc<IrreversibleBlock>,
    max_memory_ttl: u64,
}

impl CacheContext {
    pub fn new(
        rules: TtlRuleTable,
        backends: Vec<SharedBackend>,
        last_irreversible: Arc<IrreversibleBlock>,
        max_memory_ttl: u64,
    ) -> Self {
        Self {
            rules: Arc::new(rules),
            backends: backends.into(),
            last_irreversible,
            max_memory_ttl,
        }
    }

    pub fn rules(&self) -> &TtlRuleTable {
        &self.rules
    }

    pub fn backends(&self) -> &[SharedBackend] {
        &self.backends
    }

    pub fn last_irreversible(&self) -> &IrreversibleBlock {
        &self.last_irreversible
    }

    /// Serves `request` from cache, or from `upstream` on a miss.
    ///
    /// On a hit the cached response gets the live request's id and `upstream` is never
    /// called. On a miss the upstream response is returned as soon as it arrives; its
    /// cache writes run as detached tasks. Upstream failures are returned unchanged and
    /// nothing is cached for them.
    pub async fn cacher<F, Fut, E>(&self, request: &JsonRpcRequest, upstream: F) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        let key = method_urn(request);

        if let Some(cached) = reader::read(&key, &self.backends).await {
            return Ok(merge_cached_response(cached, request));
        }

        let response = upstream().await?;
        self.schedule_write(&key, &response);
        Ok(response)
    }

    fn schedule_write(&self, key: &str, response: &Value) {
        let policy = WritePolicy {
            rules: &self.rules,
            last_irreversible_block_num: self.last_irreversible.get(),
            max_memory_ttl: self.max_memory_ttl,
        };
        // fire and forget
        drop(writer::write(key, response, &policy, &self.backends));
    }
}
