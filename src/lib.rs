//! Versioned Cache - typed caching over Redis-compatible stores
//!
//! Keys and values are any serde types. Each key is combined with a version
//! tag and canonically encoded into the physical store key, so deployments
//! with different tags never read each other's entries.
//!
//! ```
//! use std::time::Duration;
//!
//! use serde::{Deserialize, Serialize};
//! use versioned_cache::{CacheError, MemoryStore, VersionedCache};
//!
//! #[derive(Serialize)]
//! struct UserKey {
//!     id: u64,
//! }
//!
//! #[derive(Serialize, Deserialize, Debug, PartialEq)]
//! struct Profile {
//!     name: String,
//! }
//!
//! # tokio_test::block_on(async {
//! let cache = VersionedCache::with_store("2024-06", MemoryStore::new());
//! let profile = Profile { name: "ada".into() };
//!
//! cache.set(&UserKey { id: 7 }, &profile, Duration::from_secs(60)).await?;
//! let cached: Profile = cache.get(&UserKey { id: 7 }).await?;
//! assert_eq!(cached, profile);
//!
//! let miss = cache.get::<_, Profile>(&UserKey { id: 8 }).await;
//! assert!(matches!(miss, Err(CacheError::NotFound(_))));
//! # Ok::<(), CacheError>(())
//! # }).unwrap();
//! ```

pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod store;

pub use cache::{VersionedCache, VersionedKey};
pub use codec::{Codec, CodecError, JsonCodec};
pub use config::{Config, DEFAULT_REDIS_ADDRESS};
pub use error::{CacheError, Result};
pub use store::{KeyValueStore, MemoryStore, RedisStore, NO_EXPIRATION};
