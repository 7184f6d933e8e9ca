//! Versioned Key Module
//!
//! Pairs a caller key with the cache's version tag.

use serde::Serialize;

use crate::codec::{Codec, CodecError};

// == Versioned Key ==
/// A caller key scoped to a version tag.
///
/// Only ever exists for the duration of one call; its encoded form is the
/// physical key sent to the store, e.g.
/// `{"content":{"id":7},"version":"0.0.1"}`.
///
/// The layout is this crate's own and is not meant to match keys written by
/// other clients of the same server. Field names are lower case and every
/// object, struct fields included, is emitted with sorted keys, so entries
/// written by a different implementation are simply never found.
#[derive(Debug, Serialize)]
pub struct VersionedKey<'a, K: ?Sized> {
    /// Cache generation
    pub version: &'a str,
    /// Caller-supplied key
    pub content: &'a K,
}

impl<'a, K> VersionedKey<'a, K>
where
    K: Serialize + ?Sized,
{
    pub fn new(version: &'a str, content: &'a K) -> Self {
        Self { version, content }
    }

    /// Encodes the key into its physical form.
    pub fn encode<C: Codec>(&self, codec: &C) -> Result<String, CodecError> {
        codec.encode(self)
    }
}
