//! Error types for the versioned cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

use crate::codec::CodecError;

/// Boxed error produced by a store backend.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// == Cache Error Enum ==
/// Unified error type for cache operations.
///
/// `NotFound` and `ValueDecoding` are both "miss-equivalent" on read paths,
/// see [`CacheError::is_miss`]. `Store` is never reported as a miss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Connection parameters could not be turned into a store client
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The caller's key could not be encoded
    #[error("Key encoding failed: {0}")]
    KeyEncoding(#[source] CodecError),

    /// The caller's value could not be encoded
    #[error("Value encoding failed: {0}")]
    ValueEncoding(#[source] CodecError),

    /// The store failed (connection, timeout, auth, ...)
    #[error("Store error: {0}")]
    Store(#[source] BoxError),

    /// No entry under the physical key
    #[error("Key not found: {0}")]
    NotFound(String),

    /// An entry exists but does not decode into the requested shape
    #[error("Value decoding failed: {0}")]
    ValueDecoding(#[source] CodecError),
}

impl CacheError {
    /// Wraps a backend error as [`CacheError::Store`].
    pub fn store<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CacheError::Store(Box::new(err))
    }

    /// Returns true for a plain cache miss.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }

    /// Returns true when the caller should recompute the value.
    ///
    /// Covers both a missing entry and an entry written by an incompatible
    /// codec or value shape.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::NotFound(_) | CacheError::ValueDecoding(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for cache operations.
pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn codec_error() -> CodecError {
        CodecError::from(serde_json::from_str::<u32>("nope").unwrap_err())
    }

    #[test]
    fn test_not_found_is_miss() {
        let err = CacheError::NotFound("k".to_string());
        assert!(err.is_not_found());
        assert!(err.is_miss());
    }

    #[test]
    fn test_decoding_is_miss_but_not_not_found() {
        let err = CacheError::ValueDecoding(codec_error());
        assert!(!err.is_not_found());
        assert!(err.is_miss());
    }

    #[test]
    fn test_store_error_is_not_miss() {
        let err = CacheError::store(io::Error::new(io::ErrorKind::ConnectionRefused, "down"));
        assert!(!err.is_miss());
        assert!(err.to_string().contains("down"));
    }

    #[test]
    fn test_store_error_keeps_source() {
        use std::error::Error as _;

        let err = CacheError::store(io::Error::new(io::ErrorKind::TimedOut, "slow"));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "slow");
    }
}
