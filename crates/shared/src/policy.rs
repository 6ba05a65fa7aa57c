//! TTL policy engine: rule table lookup plus deferred irreversibility resolution.

use serde_json::Value;

use crate::irreversible::irreversible_ttl;
use crate::jsonrpc::JsonRpcRequest;
use crate::ttl::{Ttl, TtlDirective, TtlRuleTable};
use crate::urn::method_urn;

/// Decides how long `response` to `request` may be cached.
///
/// Pure given its inputs: the immutable rule table and the block-number snapshot the
/// caller read at decision time.
pub fn decide_ttl(
    rules: &TtlRuleTable,
    request: &JsonRpcRequest,
    response: &Value,
    last_irreversible_block_num: u64,
) -> Ttl {
    ttl_for_urn(rules, &method_urn(request), response, last_irreversible_block_num)
}

/// Same as [`decide_ttl`] for an already derived URN.
pub fn ttl_for_urn(
    rules: &TtlRuleTable,
    urn: &str,
    response: &Value,
    last_irreversible_block_num: u64,
) -> Ttl {
    match rules.lookup(urn) {
        TtlDirective::NoCache => Ttl::NoCache,
        TtlDirective::NoExpire => Ttl::NoExpire,
        TtlDirective::Seconds(secs) => Ttl::Seconds(secs),
        TtlDirective::NoExpireIfIrreversible => {
            irreversible_ttl(response, last_irreversible_block_num)
        }
    }
}
