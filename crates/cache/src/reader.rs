//! Racing ("happy eyeballs") read across all cache backends.
//!
//! Every backend is queried at once, each lookup in its own task. Results are taken in
//! completion order and the first usable hit wins. Lookups still in flight at that
//! point are detached rather than cancelled: they finish in the background and their
//! results are dropped.

use std::sync::Arc;

use bytes::Bytes;
use futures::stream::{FuturesUnordered, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::backend::SharedBackend;
use crate::codec;
use crate::error::CacheError;

type Lookup = JoinHandle<(&'static str, Result<Option<Bytes>, CacheError>)>;

/// Returns the first cached value any backend yields for `key`, or `None` on a miss.
///
/// Backend errors and undecodable payloads count as a miss for that backend only.
pub async fn read(key: &str, backends: &[SharedBackend]) -> Option<Value> {
    let mut lookups: FuturesUnordered<Lookup> = backends
        .iter()
        .map(|backend| {
            let backend = Arc::clone(backend);
            let key = key.to_string();
            tokio::spawn(async move {
                let result = backend.get(&key).await;
                (backend.name(), result)
            })
        })
        .collect();

    while let Some(joined) = lookups.next().await {
        let (backend, result) = match joined {
            Ok(lookup) => lookup,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "cache lookup task failed");
                continue;
            }
        };

        if let Some(value) = usable(key, backend, result) {
            tracing::debug!(key = %key, backend = backend, "cache hit");
            return Some(value);
        }
    }

    tracing::debug!(key = %key, backends = backends.len(), "cache miss");
    None
}

/// Folds a backend's answer into "hit or nothing", logging failures.
fn usable(
    key: &str,
    backend: &'static str,
    result: Result<Option<Bytes>, CacheError>,
) -> Option<Value> {
    let bytes = match result {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key = %key, backend = backend, error = %e, "cache get failed");
            return None;
        }
    };

    match codec::decode(&bytes) {
        Ok(value) if !value.is_null() => Some(value),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(key = %key, backend = backend, error = %e, "undecodable cached value");
            None
        }
    }
}
