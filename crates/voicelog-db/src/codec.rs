//! JSON encoding of stored blobs.
//!
//! Decoding is lenient: a missing key and a blob that fails to parse both
//! come back as the type's default, so a corrupted key never stops the
//! pipeline from starting. Parse failures are logged.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Encode a value as a JSON string.
///
/// # Errors
///
/// Returns [`StoreError::Serialization`] if serialization fails.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(value)?)
}

/// Decode the blob stored at `key`, falling back to `T::default()` when the
/// blob is absent, `null`, or malformed.
pub fn decode_or_default<T>(key: &str, blob: Option<&str>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = blob else {
        return T::default();
    };
    match serde_json::from_str::<Option<T>>(raw) {
        Ok(value) => value.unwrap_or_default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding malformed stored value");
            T::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_blob_is_default() {
        let v: Vec<u32> = decode_or_default("k", None);
        assert!(v.is_empty());
    }

    #[test]
    fn null_blob_is_default() {
        let v: Vec<u32> = decode_or_default("k", Some("null"));
        assert!(v.is_empty());
    }

    #[test]
    fn malformed_blob_is_default() {
        let v: Vec<u32> = decode_or_default("k", Some("{not json"));
        assert!(v.is_empty());
        let v: Vec<u32> = decode_or_default("k", Some("{\"a\":1}"));
        assert!(v.is_empty());
    }

    #[test]
    fn valid_blob_decodes() {
        let blob = encode(&[1_u32, 2, 3]).unwrap_or_default();
        let v: Vec<u32> = decode_or_default("k", Some(&blob));
        assert_eq!(v, vec![1, 2, 3]);
    }
}
