//! # VerDB Codec
//!
//! Injectable serialization codec for VerDB log records.
//!
//! The engine is generic over the entity type; this crate supplies the
//! boundary through which typed records become bytes. A [`Codec`] works on
//! a self-describing value tree ([`serde_json::Value`]) so that the trait
//! stays object-safe; the generic [`to_payload`] / [`from_payload`] helpers
//! bridge between typed records and that tree.
//!
//! ## Usage
//!
//! ```
//! use verdb_codec::{from_payload, to_payload, JsonCodec};
//!
//! let codec = JsonCodec::compact();
//! let bytes = to_payload(&codec, &vec![1u64, 2, 3]).unwrap();
//! let back: Vec<u64> = from_payload(&codec, &bytes).unwrap();
//! assert_eq!(back, vec![1, 2, 3]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod json;

pub use error::{CodecError, CodecResult};
pub use json::JsonCodec;

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A wire encoding for VerDB log records.
///
/// Implementations map between a self-describing value tree and bytes.
/// The trait is object-safe so a database can hold any codec behind
/// `Arc<dyn Codec>`.
pub trait Codec: Send + Sync {
    /// Encodes a value tree to bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be represented in this encoding.
    fn encode_value(&self, value: &serde_json::Value) -> CodecResult<Vec<u8>>;

    /// Decodes bytes back into a value tree.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not valid for this encoding.
    fn decode_value(&self, bytes: &[u8]) -> CodecResult<serde_json::Value>;

    /// File extension used for records written in this encoding.
    fn extension(&self) -> &'static str;
}

/// Encodes any serializable value through the given codec.
///
/// # Errors
///
/// Returns an error if serialization or encoding fails.
pub fn to_payload<T: Serialize>(codec: &dyn Codec, value: &T) -> CodecResult<Vec<u8>> {
    let tree = serde_json::to_value(value).map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    codec.encode_value(&tree)
}

/// Decodes bytes produced by [`to_payload`] back into a typed value.
///
/// # Errors
///
/// Returns an error if decoding or deserialization fails.
pub fn from_payload<T: DeserializeOwned>(codec: &dyn Codec, bytes: &[u8]) -> CodecResult<T> {
    let tree = codec.decode_value(bytes)?;
    serde_json::from_value(tree).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        id: u64,
        title: String,
        prices: Vec<f64>,
    }

    #[test]
    fn typed_round_trip() {
        let codec = JsonCodec::compact();
        let sample = Sample {
            id: 7,
            title: "Soap".to_string(),
            prices: vec![1.79, 2.99],
        };
        let bytes = to_payload(&codec, &sample).unwrap();
        let back: Sample = from_payload(&codec, &bytes).unwrap();
        assert_eq!(back, sample);
    }

    #[test]
    fn integer_map_keys_round_trip() {
        // History maps are keyed by snapshot version numbers.
        let codec = JsonCodec::compact();
        let map: BTreeMap<u64, Vec<u64>> = BTreeMap::from([(0, vec![1]), (3, vec![2, 5])]);
        let bytes = to_payload(&codec, &map).unwrap();
        let back: BTreeMap<u64, Vec<u64>> = from_payload(&codec, &bytes).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn decode_garbage_fails() {
        let codec = JsonCodec::compact();
        assert!(codec.decode_value(b"not json").is_err());
    }
}
