//! TTL directives and the longest-prefix rule table.
//!
//! Rules map URN prefixes to a [`TtlDirective`]. The table is built once at startup
//! and shared read-only between all request flows. Lookups return the directive of the
//! longest rule prefix that is a prefix of the URN (character-wise, not segment-wise),
//! or [`TtlDirective::NoCache`] if nothing matches.
//!
//! In configuration, directives are plain integers: `0` never caches, `-1` caches
//! forever, `-2` caches forever once the referenced block is irreversible, and any
//! positive value is a lifetime in seconds.

use std::path::Path;
use std::time::Duration;

use radix_trie::{Trie, TrieCommon};
use serde::Deserialize;

use crate::error::ConfigError;

pub const NO_CACHE: i64 = 0;
pub const NO_EXPIRE: i64 = -1;
pub const NO_EXPIRE_IF_IRREVERSIBLE: i64 = -2;

/// Default cap applied to TTLs written into bounded in-memory backends.
pub const DEFAULT_MAX_MEMORY_TTL: u64 = 60;

/// A configured caching rule, before resolution against a concrete response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlDirective {
    NoCache,
    NoExpire,
    /// Resolved only once the response is known, by comparing its block number with
    /// the last irreversible block.
    NoExpireIfIrreversible,
    Seconds(u64),
}

impl TryFrom<i64> for TtlDirective {
    type Error = ConfigError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            NO_CACHE => Ok(Self::NoCache),
            NO_EXPIRE => Ok(Self::NoExpire),
            NO_EXPIRE_IF_IRREVERSIBLE => Ok(Self::NoExpireIfIrreversible),
            n if n > 0 => Ok(Self::Seconds(n as u64)),
            n => Err(ConfigError::InvalidTtl(n)),
        }
    }
}

/// A fully resolved cache lifetime, ready to hand to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    NoCache,
    NoExpire,
    Seconds(u64),
}

impl Ttl {
    /// Applies the bounded-memory cap: `min(self, max_secs)`, with `NoExpire` treated as
    /// unbounded and `NoCache` left untouched.
    pub fn capped(self, max_secs: u64) -> Ttl {
        match self {
            Ttl::NoCache => Ttl::NoCache,
            Ttl::NoExpire => Ttl::Seconds(max_secs),
            Ttl::Seconds(secs) => Ttl::Seconds(secs.min(max_secs)),
        }
    }

    /// Expiry for a backend `set`, where the inner `None` means "store without
    /// expiration". Returns `None` when nothing should be written.
    pub fn expiry(self) -> Option<Option<Duration>> {
        match self {
            Ttl::NoCache | Ttl::Seconds(0) => None,
            Ttl::NoExpire => Some(None),
            Ttl::Seconds(secs) => Some(Some(Duration::from_secs(secs))),
        }
    }
}

/// One `(prefix, ttl)` entry as it appears in a rules file.
#[derive(Debug, Clone, Deserialize)]
pub struct TtlRule {
    pub prefix: String,
    pub ttl: i64,
}

/// Built-in rules used when no rules file is configured.
pub static DEFAULT_RULES: &[(&str, i64)] = &[
    ("steemd", 3),
    ("steemd.database_api.get_block", NO_EXPIRE_IF_IRREVERSIBLE),
    ("steemd.database_api.get_block_header", NO_EXPIRE_IF_IRREVERSIBLE),
    ("steemd.database_api.get_dynamic_global_properties", 1),
    ("steemd.login_api", NO_CACHE),
    ("steemd.network_broadcast_api", NO_CACHE),
    ("steemd.follow_api", 10),
    ("steemd.market_history_api", 1),
    ("hivemind", 3),
    ("yo", NO_CACHE),
    ("sbds", 10),
];

/// Immutable longest-prefix lookup from method URN to [`TtlDirective`].
///
/// Rules are inserted in registration order, so a later rule with the same prefix
/// replaces an earlier one (last-registered wins).
pub struct TtlRuleTable {
    rules: Trie<String, TtlDirective>,
}

impl TtlRuleTable {
    /// Builds a table from `(prefix, ttl)` pairs, failing on any invalid TTL value.
    pub fn new<I, S>(rules: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        let mut trie = Trie::new();
        for (prefix, ttl) in rules {
            let prefix = prefix.into();
            if prefix.is_empty() {
                return Err(ConfigError::EmptyPrefix);
            }
            let directive = TtlDirective::try_from(ttl)?;
            trie.insert(prefix, directive);
        }
        Ok(Self { rules: trie })
    }

    /// The built-in rule set.
    pub fn with_defaults() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_RULES.iter().copied())
    }

    /// Parses a JSON rules file of the form `[{"prefix": "...", "ttl": 3}, ...]`.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let rules: Vec<TtlRule> = serde_json::from_str(json)?;
        Self::new(rules.into_iter().map(|r| (r.prefix, r.ttl)))
    }

    /// Reads and parses a JSON rules file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Directive of the longest rule prefix matching `urn`, or `NoCache`.
    pub fn lookup(&self, urn: &str) -> TtlDirective {
        self.rules
            .get_ancestor_value(urn)
            .copied()
            .unwrap_or(TtlDirective::NoCache)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
