//! Wire format of cached values: zstd-compressed JSON.

use bytes::Bytes;
use serde_json::Value;

use crate::error::CacheError;

const COMPRESSION_LEVEL: i32 = 3;

pub fn encode(value: &Value) -> Result<Bytes, CacheError> {
    let json = serde_json::to_vec(value)?;
    let compressed = zstd::encode_all(json.as_slice(), COMPRESSION_LEVEL)?;
    Ok(Bytes::from(compressed))
}

pub fn decode(bytes: &[u8]) -> Result<Value, CacheError> {
    let json = zstd::decode_all(bytes)?;
    Ok(serde_json::from_slice(&json)?)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn decodes_what_it_encodes() {
        let value = json!({"id": 1, "result": {"block_id": "00000063ab", "transactions": []}});
        let bytes = encode(&value).unwrap();
        assert_eq!(decode(&bytes).unwrap(), value);
    }

    #[test]
    fn repetitive_payloads_shrink() {
        let value = json!({"result": vec!["0000000000000000000000000000000000000000"; 200]});
        let raw = serde_json::to_vec(&value).unwrap();
        assert!(encode(&value).unwrap().len() < raw.len());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode(b"definitely not zstd"),
            Err(CacheError::Compression(_))
        ));
    }

    #[test]
    fn compressed_non_json_is_rejected() {
        let bytes = zstd::encode_all(&b"{not json"[..], COMPRESSION_LEVEL).unwrap();
        assert!(matches!(decode(&bytes), Err(CacheError::Json(_))));
    }
}
