//! Versioned Cache Module
//!
//! Typed get/set over a [`KeyValueStore`], with every key scoped to a
//! version tag.

use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::cache::VersionedKey;
use crate::codec::{Codec, JsonCodec};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::store::{KeyValueStore, RedisStore};

// == Versioned Cache ==
/// Cache of serde values addressed by serde keys.
///
/// Keys are wrapped with the version tag before encoding, so bumping the
/// version makes every entry of the previous generation unreachable. Those
/// entries are left for the store's TTL or eviction to reclaim.
///
/// The cache holds no mutable state. It is `Send + Sync` whenever the store
/// is, and concurrent calls are safe as long as the store is.
pub struct VersionedCache<S, C = JsonCodec> {
    /// Backend shared by all calls
    store: S,
    /// Key and value codec
    codec: C,
    /// Version tag folded into every physical key
    version: String,
}

impl VersionedCache<RedisStore> {
    // == Constructors ==
    /// Creates a Redis-backed cache from a [`Config`].
    ///
    /// No connection is opened here; the first `set`/`get` connects.
    pub fn new(config: Config) -> Result<Self> {
        let url = config.redis_url()?;
        let store = RedisStore::open(&url).map_err(|e| CacheError::Config(e.to_string()))?;
        Ok(Self::with_store(config.version, store))
    }

    /// Creates a Redis-backed cache from a `redis://` or `rediss://` URL.
    pub fn from_url(version: impl Into<String>, url: &str) -> Result<Self> {
        let store = RedisStore::open(url).map_err(|e| CacheError::Config(e.to_string()))?;
        Ok(Self::with_store(version, store))
    }

    /// Creates a cache around an already configured redis client.
    pub fn with_redis_client(version: impl Into<String>, client: redis::Client) -> Self {
        Self::with_store(version, RedisStore::new(client))
    }
}

impl<S> VersionedCache<S>
where
    S: KeyValueStore,
{
    /// Creates a cache over any store, using the JSON codec.
    pub fn with_store(version: impl Into<String>, store: S) -> Self {
        Self::with_codec(version, store, JsonCodec)
    }
}

impl<S, C> VersionedCache<S, C>
where
    S: KeyValueStore,
    C: Codec,
{
    /// Creates a cache over any store and codec.
    pub fn with_codec(version: impl Into<String>, store: S, codec: C) -> Self {
        Self {
            store,
            codec,
            version: version.into(),
        }
    }

    /// Returns the version tag.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the physical store key for `key`.
    pub fn physical_key<K>(&self, key: &K) -> Result<String>
    where
        K: Serialize + ?Sized,
    {
        VersionedKey::new(&self.version, key)
            .encode(&self.codec)
            .map_err(CacheError::KeyEncoding)
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl`.
    ///
    /// A zero `ttl` ([`NO_EXPIRATION`](crate::store::NO_EXPIRATION)) stores
    /// the entry without expiration. Encoding failures are reported before
    /// the store is contacted. Store failures are returned as
    /// [`CacheError::Store`] without retry.
    pub async fn set<K, V>(&self, key: &K, value: &V, ttl: Duration) -> Result<()>
    where
        K: Serialize + ?Sized,
        V: Serialize + ?Sized,
    {
        let physical = self.physical_key(key)?;
        let encoded = self
            .codec
            .encode(value)
            .map_err(CacheError::ValueEncoding)?;

        self.store
            .set(&physical, &encoded, ttl)
            .await
            .map_err(CacheError::store)?;

        debug!(key = %physical, ttl_ms = ttl.as_millis() as u64, "cache set");
        Ok(())
    }

    // == Get ==
    /// Fetches and decodes the value under `key`.
    ///
    /// Returns [`CacheError::NotFound`] on a miss, which is distinct from
    /// [`CacheError::Store`] when the store cannot be reached. A stored value
    /// that is not valid UTF-8 or not valid JSON for `V` is
    /// [`CacheError::ValueDecoding`].
    pub async fn get<K, V>(&self, key: &K) -> Result<V>
    where
        K: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        let (physical, encoded) = self.fetch(key).await?;
        self.codec.decode(&encoded).map_err(|e| {
            debug!(key = %physical, error = %e, "cache value did not decode");
            CacheError::ValueDecoding(e)
        })
    }

    /// Fetches the value under `key` and decodes it into `out`.
    ///
    /// `out` is only written on success.
    pub async fn get_into<K, V>(&self, key: &K, out: &mut V) -> Result<()>
    where
        K: Serialize + ?Sized,
        V: DeserializeOwned,
    {
        let (physical, encoded) = self.fetch(key).await?;
        self.codec.decode_into(&encoded, out).map_err(|e| {
            debug!(key = %physical, error = %e, "cache value did not decode");
            CacheError::ValueDecoding(e)
        })
    }

    /// Looks up the encoded value, returning it with its physical key.
    async fn fetch<K>(&self, key: &K) -> Result<(String, Vec<u8>)>
    where
        K: Serialize + ?Sized,
    {
        let physical = self.physical_key(key)?;

        match self.store.get(&physical).await.map_err(CacheError::store)? {
            Some(encoded) => {
                debug!(key = %physical, "cache hit");
                Ok((physical, encoded))
            }
            None => {
                debug!(key = %physical, "cache miss");
                Err(CacheError::NotFound(physical))
            }
        }
    }
}

impl<S, C> fmt::Debug for VersionedCache<S, C>
where
    S: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionedCache")
            .field("version", &self.version)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, NO_EXPIRATION};
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Serialize, Deserialize, PartialEq, Default)]
    #[allow(non_snake_case)]
    struct ValueTest {
        C: String,
        D: String,
    }

    fn value() -> ValueTest {
        ValueTest {
            C: "C".to_string(),
            D: "D".to_string(),
        }
    }

    #[tokio::test]
    async fn test_set_and_get() {
        let cache = VersionedCache::with_store("0.0.1", MemoryStore::new());

        cache.set("key", &value(), NO_EXPIRATION).await.unwrap();
        let got: ValueTest = cache.get("key").await.unwrap();

        assert_eq!(got, value());
    }

    #[tokio::test]
    async fn test_get_into() {
        let cache = VersionedCache::with_store("0.0.1", MemoryStore::new());
        cache.set(&1u32, &value(), NO_EXPIRATION).await.unwrap();

        let mut out = ValueTest::default();
        cache.get_into(&1u32, &mut out).await.unwrap();
        assert_eq!(out.C, "C");
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let cache = VersionedCache::with_store("0.0.1", MemoryStore::new());

        let result: Result<ValueTest> = cache.get("missing").await;
        match result {
            Err(CacheError::NotFound(key)) => {
                assert_eq!(key, cache.physical_key("missing").unwrap());
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_set_stores_under_physical_key() {
        let store = MemoryStore::new();
        let cache = VersionedCache::with_store("v2", store.clone());

        cache.set("user", &"alice", NO_EXPIRATION).await.unwrap();

        assert_eq!(
            store.keys().await,
            vec![r#"{"content":"user","version":"v2"}"#.to_string()]
        );
    }

    #[tokio::test]
    async fn test_key_encoding_error_skips_store() {
        let store = MemoryStore::new();
        let cache = VersionedCache::with_store("v1", store.clone());
        let mut bad_key = HashMap::new();
        bad_key.insert(vec![1u8], 1);

        let result = cache.set(&bad_key, &value(), NO_EXPIRATION).await;
        assert!(matches!(result, Err(CacheError::KeyEncoding(_))));

        let result: Result<ValueTest> = cache.get(&bad_key).await;
        assert!(matches!(result, Err(CacheError::KeyEncoding(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_value_encoding_error_skips_store() {
        let store = MemoryStore::new();
        let cache = VersionedCache::with_store("v1", store.clone());
        let mut bad_value = HashMap::new();
        bad_value.insert((1, 2), "x");

        let result = cache.set("key", &bad_value, NO_EXPIRATION).await;
        assert!(matches!(result, Err(CacheError::ValueEncoding(_))));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_get_into_keeps_out_on_decode_error() {
        let cache = VersionedCache::with_store("v1", MemoryStore::new());
        cache.set("key", &42, NO_EXPIRATION).await.unwrap();

        let mut out = value();
        let result = cache.get_into("key", &mut out).await;
        assert!(matches!(result, Err(CacheError::ValueDecoding(_))));
        assert_eq!(out, value());
    }

    #[tokio::test]
    async fn test_non_finite_floats_do_not_share_a_key() {
        #[derive(Serialize)]
        struct Reading {
            x: f64,
        }

        let store = MemoryStore::new();
        let cache = VersionedCache::with_store("v1", store.clone());

        for x in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            assert!(matches!(
                cache.physical_key(&Reading { x }),
                Err(CacheError::KeyEncoding(_))
            ));
            let result = cache.set(&Reading { x }, &"value", NO_EXPIRATION).await;
            assert!(matches!(result, Err(CacheError::KeyEncoding(_))));

            let result = cache.get::<_, String>(&Reading { x }).await;
            assert!(matches!(result, Err(CacheError::KeyEncoding(_))));
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_non_finite_value_is_value_encoding_error() {
        let store = MemoryStore::new();
        let cache = VersionedCache::with_store("v1", store.clone());

        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let result = cache.set("k", &value, NO_EXPIRATION).await;
            assert!(matches!(result, Err(CacheError::ValueEncoding(_))));
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_non_utf8_value_is_decoding_error() {
        let store = MemoryStore::new();
        let cache = VersionedCache::with_store("v1", store.clone());
        store
            .insert_raw(cache.physical_key("k").unwrap(), vec![b'"', 0xff, 0xfe, b'"'])
            .await;

        let err = cache.get::<_, String>("k").await.unwrap_err();
        assert!(matches!(err, CacheError::ValueDecoding(_)));
        assert!(err.is_miss());
    }

    #[test]
    fn test_new_from_config_is_lazy() {
        let cache = VersionedCache::new(Config::new("0.0.1")).unwrap();
        assert_eq!(cache.version(), "0.0.1");
    }

    #[test]
    fn test_new_rejects_negative_db() {
        let config = Config {
            db: -1,
            ..Config::new("0.0.1")
        };
        assert!(matches!(
            VersionedCache::new(config),
            Err(CacheError::Config(_))
        ));
    }

    #[test]
    fn test_from_url_rejects_malformed_url() {
        let result = VersionedCache::from_url("0.0.1", "definitely not a url");
        assert!(matches!(result, Err(CacheError::Config(_))));
    }

    #[test]
    fn test_new_rejects_bad_address() {
        let config = Config {
            address: "localhost:99999".to_string(),
            ..Config::new("0.0.1")
        };
        assert!(matches!(
            VersionedCache::new(config),
            Err(CacheError::Config(_))
        ));
    }

    #[test]
    fn test_with_redis_client() {
        let client = redis::Client::open("redis://127.0.0.1/").unwrap();
        let cache = VersionedCache::with_redis_client("v9", client);
        assert_eq!(cache.version(), "v9");
    }
}
