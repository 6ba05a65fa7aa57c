//! Networked cache backend on Redis.
//!
//! Uses a multiplexed `ConnectionManager` (reconnects on its own) cloned per operation.
//! Every command runs under the configured timeout.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisResult};

use crate::backend::{BackendKind, CacheBackend};
use crate::error::CacheError;

const NAME: &str = "redis";

/// Redis backend. Tagged [`BackendKind::Remote`], so it may store without expiration.
#[derive(Clone)]
pub struct RedisBackend {
    conn: ConnectionManager,
    timeout: Duration,
}

impl RedisBackend {
    /// Opens a managed connection to `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str, timeout: Duration) -> Result<Self, CacheError> {
        let client = redis::Client::open(url)?;
        let conn = tokio::time::timeout(timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout {
                backend: NAME,
                timeout,
            })??;
        Ok(Self { conn, timeout })
    }

    async fn timed<T>(&self, fut: impl Future<Output = RedisResult<T>>) -> Result<T, CacheError> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(CacheError::Timeout {
                backend: NAME,
                timeout: self.timeout,
            }),
        }
    }
}

#[async_trait]
impl CacheBackend for RedisBackend {
    fn name(&self) -> &'static str {
        NAME
    }

    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.conn.clone();
        let value: Option<Vec<u8>> = self.timed(conn.get(key)).await?;
        Ok(value.map(Bytes::from))
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        expiry: Option<Duration>,
    ) -> Result<(), CacheError> {
        let mut conn = self.conn.clone();
        match expiry {
            // SETEX rejects 0
            Some(ttl) => {
                let secs = ttl.as_secs().max(1);
                self.timed(conn.set_ex::<_, _, ()>(key, &value[..], secs))
                    .await
            }
            None => self.timed(conn.set::<_, _, ()>(key, &value[..])).await,
        }
    }
}
