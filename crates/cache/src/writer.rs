//! Fan-out write of an upstream response to every cache backend.
//!
//! Writes are detached tokio tasks. They are never awaited on the request path, and
//! because they are spawned rather than polled inline, dropping the request future
//! does not abort them.

use std::sync::Arc;

use rpcache_shared::jsonrpc::is_error_response;
use rpcache_shared::policy::ttl_for_urn;
use rpcache_shared::ttl::{Ttl, TtlRuleTable};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::backend::SharedBackend;
use crate::codec;

/// Inputs the writer needs to turn a response into per-backend writes.
pub struct WritePolicy<'a> {
    pub rules: &'a TtlRuleTable,
    pub last_irreversible_block_num: u64,
    pub max_memory_ttl: u64,
}

/// Caches `response` under `key` (the request's method URN) on every backend.
///
/// Error responses are never cached. Otherwise the TTL is decided once and then capped
/// per backend kind; backends whose effective TTL is "no cache" are skipped. Returns
/// the spawned write tasks, which callers normally drop.
pub fn write(
    key: &str,
    response: &Value,
    policy: &WritePolicy<'_>,
    backends: &[SharedBackend],
) -> Vec<JoinHandle<()>> {
    if is_error_response(response) {
        tracing::error!(
            key = %key,
            error = %response["error"],
            "jsonrpc error in response from upstream, skipping cache"
        );
        return Vec::new();
    }

    let ttl = ttl_for_urn(
        policy.rules,
        key,
        response,
        policy.last_irreversible_block_num,
    );
    fan_out(key, response, ttl, policy.max_memory_ttl, backends)
}

/// Writes `response` to each backend with that backend's effective TTL.
pub fn fan_out(
    key: &str,
    response: &Value,
    ttl: Ttl,
    max_memory_ttl: u64,
    backends: &[SharedBackend],
) -> Vec<JoinHandle<()>> {
    let targets: Vec<_> = backends
        .iter()
        .filter_map(|backend| {
            let effective = backend.kind().effective_ttl(ttl, max_memory_ttl);
            match effective.expiry() {
                Some(expiry) => Some((Arc::clone(backend), effective, expiry)),
                None => {
                    tracing::debug!(
                        key = %key,
                        backend = backend.name(),
                        ttl = ?ttl,
                        "skipping non-cacheable value"
                    );
                    None
                }
            }
        })
        .collect();

    if targets.is_empty() {
        return Vec::new();
    }

    let value = match codec::encode(response) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "failed to encode response for cache");
            return Vec::new();
        }
    };

    targets
        .into_iter()
        .map(|(backend, effective, expiry)| {
            let key = key.to_string();
            let value = value.clone();
            tracing::debug!(key = %key, backend = backend.name(), ttl = ?effective, "cache set");
            tokio::spawn(async move {
                if let Err(e) = backend.set(&key, value, expiry).await {
                    tracing::warn!(
                        key = %key,
                        backend = backend.name(),
                        error = %e,
                        "cache set failed"
                    );
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rpcache_shared::ttl::{NO_CACHE, NO_EXPIRE, NO_EXPIRE_IF_IRREVERSIBLE};
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryBackend;
    use crate::reader;
    use crate::testing::{as_shared, StubBackend};

    fn rules() -> TtlRuleTable {
        TtlRuleTable::new([
            ("steemd", 3),
            ("steemd.database_api.get_block", NO_EXPIRE_IF_IRREVERSIBLE),
            ("steemd.database_api.get_config", NO_EXPIRE),
            ("steemd.login_api", NO_CACHE),
        ])
        .unwrap()
    }

    fn policy(rules: &TtlRuleTable, lib: u64) -> WritePolicy<'_> {
        WritePolicy {
            rules,
            last_irreversible_block_num: lib,
            max_memory_ttl: 60,
        }
    }

    async fn join(handles: Vec<JoinHandle<()>>) {
        for handle in handles {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn no_expire_is_capped_only_for_memory() {
        let rules = rules();
        let stubs = [StubBackend::memory("mem").shared(), StubBackend::remote("net").shared()];
        let response = json!({"id": 1, "result": {"chain_id": "00"}});

        join(write(
            "steemd.database_api.get_config",
            &response,
            &policy(&rules, 0),
            &as_shared(&stubs),
        ))
        .await;

        let mem = stubs[0].sets();
        let net = stubs[1].sets();
        assert_eq!(mem.len(), 1);
        assert_eq!(mem[0].expiry, Some(Duration::from_secs(60)));
        assert_eq!(net.len(), 1);
        assert_eq!(net[0].expiry, None);
        assert_eq!(codec::decode(&net[0].value).unwrap(), response);
        assert_eq!(net[0].key, "steemd.database_api.get_config");
    }

    #[tokio::test]
    async fn short_ttl_is_passed_through() {
        let rules = rules();
        let stubs = [StubBackend::memory("mem").shared(), StubBackend::remote("net").shared()];

        join(write(
            "steemd.database_api.get_accounts.params=[[\"a\"]]",
            &json!({"id": 1, "result": []}),
            &policy(&rules, 0),
            &as_shared(&stubs),
        ))
        .await;

        assert_eq!(stubs[0].sets()[0].expiry, Some(Duration::from_secs(3)));
        assert_eq!(stubs[1].sets()[0].expiry, Some(Duration::from_secs(3)));
    }

    #[tokio::test]
    async fn error_responses_are_never_written() {
        let rules = rules();
        let stubs = [StubBackend::memory("mem").shared(), StubBackend::remote("net").shared()];

        let handles = write(
            "steemd.database_api.get_config",
            &json!({"id": 1, "error": {"code": -32000, "message": "boom"}}),
            &policy(&rules, 0),
            &as_shared(&stubs),
        );

        assert!(handles.is_empty());
        assert!(stubs[0].sets().is_empty());
        assert!(stubs[1].sets().is_empty());
    }

    #[tokio::test]
    async fn no_cache_skips_every_backend() {
        let rules = rules();
        let stubs = [StubBackend::memory("mem").shared(), StubBackend::remote("net").shared()];

        let handles = write(
            "steemd.login_api.login",
            &json!({"id": 1, "result": true}),
            &policy(&rules, 0),
            &as_shared(&stubs),
        );

        assert!(handles.is_empty());
        assert!(stubs[0].sets().is_empty());
        assert!(stubs[1].sets().is_empty());
    }

    #[tokio::test]
    async fn irreversible_block_is_cached() {
        let rules = rules();
        let stubs = [StubBackend::memory("mem").shared(), StubBackend::remote("net").shared()];
        let response = json!({"id": 1, "result": {"block_id": "00000063deadbeef"}});

        join(write(
            "steemd.database_api.get_block.params=[99]",
            &response,
            &policy(&rules, 100),
            &as_shared(&stubs),
        ))
        .await;

        assert_eq!(stubs[0].sets()[0].expiry, Some(Duration::from_secs(60)));
        assert_eq!(stubs[1].sets()[0].expiry, None);
    }

    #[tokio::test]
    async fn reversible_block_is_not_cached() {
        let rules = rules();
        let stubs = [StubBackend::memory("mem").shared(), StubBackend::remote("net").shared()];

        let handles = write(
            "steemd.database_api.get_block.params=[101]",
            &json!({"id": 1, "result": {"block_id": "00000065deadbeef"}}),
            &policy(&rules, 100),
            &as_shared(&stubs),
        );

        assert!(handles.is_empty());
        assert!(stubs[0].sets().is_empty());
        assert!(stubs[1].sets().is_empty());
    }

    #[tokio::test]
    async fn one_failing_backend_does_not_affect_others() {
        let rules = rules();
        let stubs = [
            StubBackend::remote("down").failing().shared(),
            StubBackend::memory("mem").shared(),
        ];

        join(write(
            "steemd.database_api.get_config",
            &json!({"id": 1, "result": {}}),
            &policy(&rules, 0),
            &as_shared(&stubs),
        ))
        .await;

        assert_eq!(stubs[0].sets().len(), 1);
        assert_eq!(stubs[1].sets().len(), 1);
    }

    #[tokio::test]
    async fn zero_memory_cap_skips_memory_backend() {
        let rules = rules();
        let stubs = [StubBackend::memory("mem").shared(), StubBackend::remote("net").shared()];
        let policy = WritePolicy {
            rules: &rules,
            last_irreversible_block_num: 0,
            max_memory_ttl: 0,
        };

        join(write(
            "steemd.database_api.get_config",
            &json!({"id": 1, "result": {}}),
            &policy,
            &as_shared(&stubs),
        ))
        .await;

        assert!(stubs[0].sets().is_empty());
        assert_eq!(stubs[1].sets().len(), 1);
    }

    #[tokio::test]
    async fn repeated_writes_are_idempotent() {
        let rules = rules();
        let backends: Vec<SharedBackend> = vec![Arc::new(MemoryBackend::new(100))];
        let response = json!({"id": 1, "result": {"x": 1}});
        let key = "steemd.database_api.get_config";

        join(write(key, &response, &policy(&rules, 0), &backends)).await;
        let first = reader::read(key, &backends).await;
        join(write(key, &response, &policy(&rules, 0), &backends)).await;
        let second = reader::read(key, &backends).await;

        assert_eq!(first, Some(response));
        assert_eq!(first, second);
    }
}
