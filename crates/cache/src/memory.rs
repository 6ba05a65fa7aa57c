//! In-process cache backend built on moka.
//!
//! Each entry carries its own expiry (from the TTL policy), enforced through moka's
//! `Expiry` hook. Capacity is bounded in entries; eviction is left to moka.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use moka::future::Cache;
use moka::Expiry;

use crate::backend::{BackendKind, CacheBackend};
use crate::error::CacheError;

#[derive(Clone)]
struct Entry {
    value: Bytes,
    expiry: Option<Duration>,
}

struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        entry.expiry
    }

    // overwrites take the new entry's ttl
    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.expiry
    }
}

/// Bounded in-memory backend. Tagged [`BackendKind::Memory`], so writers cap its TTLs.
#[derive(Clone)]
pub struct MemoryBackend {
    cache: Cache<String, Entry>,
}

impl MemoryBackend {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryExpiry)
                .build(),
        }
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        Ok(self.cache.get(key).await.map(|entry| entry.value))
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        expiry: Option<Duration>,
    ) -> Result<(), CacheError> {
        self.cache.insert(key.to_string(), Entry { value, expiry }).await;
        Ok(())
    }
}
