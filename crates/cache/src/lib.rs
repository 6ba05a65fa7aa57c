//! Multi-backend response caching for the JSON-RPC proxy.
//!
//! [`context::CacheContext::cacher`] wraps an upstream call: it races all backends for
//! a cached response, and on a miss calls upstream and schedules detached writes to
//! every backend with a per-backend TTL.

pub mod backend;
pub mod codec;
pub mod context;
pub mod error;
pub mod memory;
pub mod reader;
pub mod redis_backend;
pub mod writer;

#[cfg(test)]
pub(crate) mod testing;
