//! Store Module
//!
//! The key-value backend contract consumed by the cache, plus the Redis and
//! in-process implementations.

mod entry;
mod memory;
mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use entry::StoredEntry;
pub use memory::{MemoryStore, MemoryStoreError};
pub use redis_store::RedisStore;

/// TTL meaning "never expire".
pub const NO_EXPIRATION: Duration = Duration::ZERO;

// == Key-Value Store ==
/// A string key-value backend with per-entry expiration.
///
/// Implementations must be safe for concurrent use: a single cache shares its
/// store across every in-flight call without additional locking.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Backend failure (connection, timeout, auth, ...).
    type Error: std::error::Error + Send + Sync + 'static;

    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// A `ttl` of [`NO_EXPIRATION`] keeps the entry until it is evicted.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Self::Error>;

    /// Fetches the raw value under `key`, `None` when absent or expired.
    ///
    /// Bytes are returned as stored. Checking that they are text belongs to
    /// the codec, so a foreign value is never mistaken for a store failure.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error>;
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    type Error = S::Error;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Self::Error> {
        (**self).set(key, value, ttl).await
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        (**self).get(key).await
    }
}
