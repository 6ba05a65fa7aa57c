use std::time::Duration;

/// Failures of a single cache backend operation.
///
/// These never reach the client: a failed read counts as a miss for that backend and
/// a failed write is dropped.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("{backend} timed out after {timeout:?}")]
    Timeout {
        backend: &'static str,
        timeout: Duration,
    },

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("compression error: {0}")]
    Compression(#[from] std::io::Error),

    #[error("invalid cached json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Backend(String),
}
