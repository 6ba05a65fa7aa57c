//! Cache key derivation: maps a JSON-RPC call onto a method URN.
//!
//! The URN has the shape `{namespace}.{api}.{method}[.params={json}]`, e.g.
//! `steemd.database_api.get_block.params=[1000]`. TTL rules are matched against the
//! URN by prefix, so the most general part comes first.

use serde_json::{Map, Value};

use crate::jsonrpc::JsonRpcRequest;

/// Namespace assumed for methods that carry no `namespace.` prefix.
pub const DEFAULT_NAMESPACE: &str = "steemd";

/// API assumed for bare methods in the default namespace.
const DEFAULT_API: &str = "database_api";

/// Derives the cache key for a single JSON-RPC request.
///
/// Pure and deterministic: identical `method` + `params` always produce the same URN,
/// regardless of object key order inside `params`. The request `id` never participates.
pub fn method_urn(request: &JsonRpcRequest) -> String {
    let method = request.method.as_str();
    let mut params = request.params.as_ref();

    let (namespace, rest) = method.split_once('.').unwrap_or((DEFAULT_NAMESPACE, method));

    let mut urn = if namespace == DEFAULT_NAMESPACE {
        let (api, name) = match rest.split_once('.') {
            Some(pair) => pair,
            None if rest == "call" => match call_target(params) {
                Some((api, name, args)) => {
                    params = args;
                    (api, name)
                }
                None => (DEFAULT_API, rest),
            },
            None => (DEFAULT_API, rest),
        };
        format!("{namespace}.{api}.{name}")
    } else {
        format!("{namespace}.{rest}")
    };

    if let Some(params) = params.filter(|p| !is_empty_params(p)) {
        urn.push_str(".params=");
        urn.push_str(&canonical(params).to_string());
    }
    urn
}

/// Unpacks `call` params of the form `[api, method, args?]`.
fn call_target(params: Option<&Value>) -> Option<(&str, &str, Option<&Value>)> {
    let args = params?.as_array()?;
    let api = args.first()?.as_str()?;
    let name = args.get(1)?.as_str()?;
    Some((api, name, args.get(2)))
}

fn is_empty_params(params: &Value) -> bool {
    match params {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

/// Rebuilds objects with sorted keys so serialization is independent of map ordering.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        Value::Object(obj) => {
            let mut keys: Vec<&String> = obj.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(obj.len());
            for key in keys {
                sorted.insert(key.clone(), canonical(&obj[key]));
            }
            Value::Object(sorted)
        }
        other => other.clone(),
    }
}
