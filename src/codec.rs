//! Codec Module
//!
//! Canonical text encoding for cache keys and values.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

mod finite;

// == Codec Error ==
/// Failure to encode or decode a value.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct CodecError(#[from] serde_json::Error);

// == Codec Trait ==
/// Converts structured values to text and back.
///
/// `encode` must be deterministic: structurally equal inputs produce the same
/// string, since encoded keys address entries in the store. `decode` takes the
/// raw stored bytes, so text that is not UTF-8 is a decode error like any other.
pub trait Codec: Send + Sync {
    /// Encodes `value` into its canonical text form.
    fn encode<T>(&self, value: &T) -> Result<String, CodecError>
    where
        T: Serialize + ?Sized;

    /// Decodes `bytes` into a fresh `T`.
    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned;

    /// Decodes `bytes` into `out`, leaving it untouched on failure.
    fn decode_into<T>(&self, bytes: &[u8], out: &mut T) -> Result<(), CodecError>
    where
        T: DeserializeOwned,
    {
        *out = self.decode(bytes)?;
        Ok(())
    }
}

// == JSON Codec ==
/// JSON codec with sorted object keys.
///
/// Values pass through `serde_json::Value`, whose map is ordered by key, so a
/// `HashMap` encodes the same way whatever its iteration order. This relies on
/// serde_json's `preserve_order` feature staying disabled.
///
/// NaN and infinite floats are rejected: JSON would write them as `null`,
/// colliding with `None` and failing to decode back into a float.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T>(&self, value: &T) -> Result<String, CodecError>
    where
        T: Serialize + ?Sized,
    {
        finite::ensure_finite(value)?;
        let canonical = serde_json::to_value(value)?;
        Ok(serde_json::to_string(&canonical)?)
    }

    fn decode<T>(&self, bytes: &[u8]) -> Result<T, CodecError>
    where
        T: DeserializeOwned,
    {
        Ok(serde_json::from_slice(bytes)?)
    }
}
