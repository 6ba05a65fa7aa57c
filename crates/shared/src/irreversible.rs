//! Last-irreversible-block tracking and resolution of deferred TTLs.
//!
//! Block ids encode the block number in their first 4 bytes, so the first 8 hex
//! characters of `result.block_id` give the height the response refers to. A response
//! is cacheable forever only once that height is at or below the last irreversible
//! block; until then it could still be reorganised away.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::BlockIdError;
use crate::jsonrpc::is_error_response;
use crate::ttl::Ttl;

/// Hex characters of a block id that encode the block number.
const BLOCK_NUM_HEX_LEN: usize = 8;

/// Process-wide snapshot of the last irreversible block number.
///
/// Written by the background poller and read on every cache write. Reads and writes
/// are single atomic operations; no ordering with other state is implied.
#[derive(Debug, Default)]
pub struct IrreversibleBlock {
    num: AtomicU64,
    updated_at: AtomicI64,
}

impl IrreversibleBlock {
    pub fn new(num: u64) -> Self {
        let tracker = Self::default();
        tracker.set(num);
        tracker
    }

    pub fn get(&self) -> u64 {
        self.num.load(Ordering::Acquire)
    }

    pub fn set(&self, num: u64) {
        self.num.store(num, Ordering::Release);
        self.updated_at
            .store(Utc::now().timestamp(), Ordering::Release);
    }

    /// When the number was last stored, or `None` if it never was.
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        match self.updated_at.load(Ordering::Acquire) {
            0 => None,
            secs => DateTime::from_timestamp(secs, 0),
        }
    }
}

/// Extracts the block number referenced by `result.block_id`.
pub fn block_num_from_response(response: &Value) -> Result<u64, BlockIdError> {
    if is_error_response(response) {
        return Err(BlockIdError::ErrorResponse);
    }
    let block_id = response
        .get("result")
        .and_then(|r| r.get("block_id"))
        .ok_or(BlockIdError::Missing)?;
    let block_id = block_id.as_str().ok_or(BlockIdError::NotAString)?;
    block_num_from_id(block_id)
}

/// Parses the first 4 bytes (8 hex digits) of a block id as the block number.
pub fn block_num_from_id(block_id: &str) -> Result<u64, BlockIdError> {
    let prefix = block_id.get(..BLOCK_NUM_HEX_LEN).unwrap_or(block_id);
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(BlockIdError::Malformed(block_id.to_string()));
    }
    u64::from_str_radix(prefix, 16).map_err(|_| BlockIdError::Malformed(block_id.to_string()))
}

/// Resolves a deferred "no expire if irreversible" directive against a response.
///
/// Returns `NoExpire` when the response's block is already irreversible and `NoCache`
/// otherwise. Any extraction failure also yields `NoCache`.
pub fn irreversible_ttl(response: &Value, last_irreversible_block_num: u64) -> Ttl {
    match block_num_from_response(response) {
        Ok(block_num) if last_irreversible_block_num < block_num => Ttl::NoCache,
        Ok(_) => Ttl::NoExpire,
        Err(e) => {
            tracing::warn!(error = %e, "unable to cache using last irreversible block");
            Ttl::NoCache
        }
    }
}
