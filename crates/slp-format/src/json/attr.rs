//! `decode_json_attribute`: the one normalizer every JSON-bearing HDF5
//! attribute or dataset value passes through (spec §4.2).

use crate::error::{Result, SlpError};
use slp_core::AttrValue;

/// Normalizes an attribute value that is known to carry JSON (a string, or
/// bytes that decode to one) into a [`serde_json::Value`].
///
/// HDF5 fixed-length string attributes are NUL-padded; `AttrValue::as_str_lossy`
/// already trims that padding before this ever reaches `serde_json`.
pub fn decode_json_attribute(value: &AttrValue) -> Result<serde_json::Value> {
    let text = value
        .as_str_lossy()
        .ok_or_else(|| SlpError::InvalidSlp("attribute is not string/byte JSON".into()))?;
    serde_json::from_str(&text).map_err(SlpError::from)
}

/// Same normalization, but for raw bytes that didn't come through the
/// `AttrValue` tagged union (e.g. a per-row `tracks_json`/`videos_json`
/// vlen entry).
pub fn decode_json_bytes(bytes: &[u8]) -> Result<serde_json::Value> {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let text = std::str::from_utf8(&bytes[..end])
        .map_err(|_| SlpError::InvalidSlp("JSON bytes are not valid UTF-8".into()))?;
    serde_json::from_str(text).map_err(SlpError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_nul_padding_before_parsing() {
        let v = AttrValue::Str("{\"a\":1}\0\0\0".to_string());
        let parsed = decode_json_attribute(&v).unwrap();
        assert_eq!(parsed["a"], 1);
    }

    #[test]
    fn decodes_bytes_variant() {
        let v = AttrValue::Bytes(b"{\"b\":2}\0".to_vec());
        let parsed = decode_json_attribute(&v).unwrap();
        assert_eq!(parsed["b"], 2);
    }

    #[test]
    fn rejects_non_string_attr() {
        let v = AttrValue::Float(1.0);
        assert!(decode_json_attribute(&v).is_err());
    }
}
