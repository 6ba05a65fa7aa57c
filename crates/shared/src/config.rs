//! Process configuration read from environment variables.
//!
//! Environment variables:
//! - `UPSTREAM_URL`: JSON-RPC endpoint of the blockchain node (required)
//! - `PORT`: HTTP listen port (default: 8080)
//! - `REDIS_URL`: enables the Redis cache backend when set
//! - `REDIS_TIMEOUT_SECS`: per-operation Redis timeout (default: 3)
//! - `UPSTREAM_TIMEOUT_SECS`: upstream HTTP timeout (default: 30)
//! - `MEMORY_CACHE_MAX_TTL_SECS`: TTL cap for the in-memory backend (default: 60)
//! - `MEMORY_CACHE_CAPACITY`: max entries in the in-memory backend (default: 100000)
//! - `TTL_RULES_PATH`: JSON ttl rules file; built-in defaults when unset
//! - `IRREVERSIBLE_POLL_INTERVAL_SECS`: seconds between irreversible block polls (default: 3)

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::ttl::{TtlRuleTable, DEFAULT_MAX_MEMORY_TTL};

#[derive(Debug, Clone)]
pub struct Config {
    pub upstream_url: String,
    pub port: u16,
    pub redis_url: Option<String>,
    pub redis_timeout: Duration,
    pub upstream_timeout: Duration,
    pub memory_cache_max_ttl: u64,
    pub memory_cache_capacity: u64,
    pub ttl_rules_path: Option<String>,
    pub poll_interval: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let upstream_url = lookup("UPSTREAM_URL")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar("UPSTREAM_URL"))?;

        Ok(Self {
            upstream_url,
            port: parse_var(&lookup, "PORT", 8080)?,
            redis_url: lookup("REDIS_URL").filter(|v| !v.is_empty()),
            redis_timeout: Duration::from_secs(parse_var(&lookup, "REDIS_TIMEOUT_SECS", 3)?),
            upstream_timeout: Duration::from_secs(parse_var(&lookup, "UPSTREAM_TIMEOUT_SECS", 30)?),
            memory_cache_max_ttl: parse_var(
                &lookup,
                "MEMORY_CACHE_MAX_TTL_SECS",
                DEFAULT_MAX_MEMORY_TTL,
            )?,
            memory_cache_capacity: parse_var(&lookup, "MEMORY_CACHE_CAPACITY", 100_000)?,
            ttl_rules_path: lookup("TTL_RULES_PATH").filter(|v| !v.is_empty()),
            poll_interval: Duration::from_secs(parse_var(
                &lookup,
                "IRREVERSIBLE_POLL_INTERVAL_SECS",
                3,
            )?),
        })
    }

    /// Loads the ttl rule table from `TTL_RULES_PATH`, or the built-in defaults.
    pub fn ttl_rules(&self) -> Result<TtlRuleTable, ConfigError> {
        match &self.ttl_rules_path {
            Some(path) => TtlRuleTable::from_path(path),
            None => TtlRuleTable::with_defaults(),
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(var) {
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidVar { var, value }),
        None => Ok(default),
    }
}
