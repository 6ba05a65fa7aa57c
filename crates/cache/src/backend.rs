//! The cache backend capability consumed by the reader and writer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use rpcache_shared::ttl::Ttl;

use crate::error::CacheError;

/// Whether a backend is subject to the in-memory TTL cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// Bounded, in-process memory. TTLs are capped so entries cannot pile up forever.
    Memory,
    /// Unbounded or networked storage that may keep entries without expiration.
    Remote,
}

impl BackendKind {
    /// The TTL this kind of backend should actually be given for `ttl`.
    pub fn effective_ttl(self, ttl: Ttl, max_memory_ttl: u64) -> Ttl {
        match self {
            BackendKind::Memory => ttl.capped(max_memory_ttl),
            BackendKind::Remote => ttl,
        }
    }
}

/// A cache store shared by all request flows.
///
/// Implementations handle their own internal synchronization; callers invoke `get` and
/// `set` concurrently from many tasks.
#[async_trait]
pub trait CacheBackend: Send + Sync + 'static {
    /// Short name used in logs and the status endpoint.
    fn name(&self) -> &'static str;

    fn kind(&self) -> BackendKind;

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    /// Stores `value` under `key`. `expiry: None` stores it without expiration.
    async fn set(&self, key: &str, value: Bytes, expiry: Option<Duration>)
        -> Result<(), CacheError>;
}

pub type SharedBackend = Arc<dyn CacheBackend>;
