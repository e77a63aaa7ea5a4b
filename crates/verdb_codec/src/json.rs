//! JSON codec implementation.

use crate::error::{CodecError, CodecResult};
use crate::Codec;

/// JSON encoding for log records.
///
/// Pretty printing is a cosmetic option: both forms decode identically, so
/// a log may freely mix records written with either setting.
#[derive(Debug, Clone, Copy)]
pub struct JsonCodec {
    pretty: bool,
}

impl JsonCodec {
    /// Creates a JSON codec.
    #[must_use]
    pub const fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Creates a pretty-printing JSON codec.
    #[must_use]
    pub const fn pretty() -> Self {
        Self::new(true)
    }

    /// Creates a compact JSON codec.
    #[must_use]
    pub const fn compact() -> Self {
        Self::new(false)
    }
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self::pretty()
    }
}

impl Codec for JsonCodec {
    fn encode_value(&self, value: &serde_json::Value) -> CodecResult<Vec<u8>> {
        let result = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        result.map_err(|e| CodecError::encoding_failed(e.to_string()))
    }

    fn decode_value(&self, bytes: &[u8]) -> CodecResult<serde_json::Value> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
    }

    fn extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_and_pretty_decode_identically() {
        let value = serde_json::json!({"id": 1, "title": "Soap"});
        let compact = JsonCodec::compact().encode_value(&value).unwrap();
        let pretty = JsonCodec::pretty().encode_value(&value).unwrap();
        assert_ne!(compact, pretty);
        assert_eq!(
            JsonCodec::compact().decode_value(&compact).unwrap(),
            JsonCodec::pretty().decode_value(&pretty).unwrap()
        );
    }

    #[test]
    fn extension_is_json() {
        assert_eq!(JsonCodec::default().extension(), "json");
    }
}
