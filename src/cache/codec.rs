//! Result Codec Module
//!
//! Serializes computation results to bytes for disk storage and back.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

// == Result Codec ==
/// Converts result values to and from their stored byte form.
///
/// Implementations must satisfy `decode(encode(v)) == v` for every value they
/// accept, and report anything they cannot represent as
/// [`CacheError::Encoding`](crate::CacheError::Encoding) instead of dropping it.
pub trait ResultCodec: Send + Sync {
    /// Short name recorded in entry headers; entries written by another codec
    /// are treated as absent.
    fn name(&self) -> &'static str;

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>>;

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T>;
}

// == JSON Codec ==
/// Human-readable codec backed by serde_json. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl ResultCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// == Bincode Codec ==
/// Compact binary codec backed by bincode.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeCodec;

impl ResultCodec for BincodeCodec {
    fn name(&self) -> &'static str {
        "bincode"
    }

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        Ok(bincode::serialize(value)?)
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(bytes)?)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use serde::Deserialize;
    use std::collections::{BTreeMap, HashMap};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Report {
        name: String,
        scores: Vec<f64>,
        tags: BTreeMap<String, u32>,
        parent: Option<Box<Report>>,
    }

    fn sample_report() -> Report {
        let mut tags = BTreeMap::new();
        tags.insert("fast".to_string(), 1);
        Report {
            name: "run".to_string(),
            scores: vec![0.5, 1.25, -3.0],
            tags,
            parent: Some(Box::new(Report {
                name: "base".to_string(),
                scores: vec![],
                tags: BTreeMap::new(),
                parent: None,
            })),
        }
    }

    #[test]
    fn test_json_nested_struct() {
        let codec = JsonCodec;
        let report = sample_report();
        let bytes = codec.encode(&report).unwrap();
        let decoded: Report = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, report);
    }

    #[test]
    fn test_bincode_nested_struct() {
        let codec = BincodeCodec;
        let report = sample_report();
        let bytes = codec.encode(&report).unwrap();
        let decoded: Report = codec.decode(&bytes).unwrap();
        assert_eq!(decoded, report);
    }

    #[test]
    fn test_json_rejects_non_string_map_keys() {
        let mut map = HashMap::new();
        map.insert((1, 2), "pair");
        let result = JsonCodec.encode(&map);
        assert!(matches!(result, Err(CacheError::Encoding(_))));
    }

    #[test]
    fn test_decode_wrong_type_is_encoding_error() {
        let bytes = JsonCodec.encode(&"text").unwrap();
        let result: Result<u32> = JsonCodec.decode(&bytes);
        assert!(matches!(result, Err(CacheError::Encoding(_))));
    }

    #[test]
    fn test_bincode_truncated_input_is_encoding_error() {
        let bytes = BincodeCodec.encode(&vec![1u64, 2, 3]).unwrap();
        let result: Result<Vec<u64>> = BincodeCodec.decode(&bytes[..bytes.len() - 1]);
        assert!(matches!(result, Err(CacheError::Encoding(_))));
    }

    #[test]
    fn test_codec_names_differ() {
        assert_ne!(JsonCodec.name(), BincodeCodec.name());
    }
}
