//! Redis Store Module
//!
//! [`KeyValueStore`] backed by a Redis-compatible server.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, RedisError};
use tokio::sync::OnceCell;
use tracing::debug;

use super::KeyValueStore;

/// Redis-backed store.
///
/// The connection is opened on first use and then shared: a multiplexed
/// connection pipelines concurrent commands over one socket. Reconnection,
/// timeouts and auth are left to the redis client.
///
/// Values are read back as bytes, so a non-UTF-8 value written by another
/// client reaches the codec instead of failing inside the redis conversion.
pub struct RedisStore {
    /// Redis client
    client: Client,
    /// Lazily opened connection
    connection: OnceCell<MultiplexedConnection>,
}

impl RedisStore {
    /// Wraps an existing client. No connection is made until the first call.
    pub fn new(client: Client) -> Self {
        Self {
            client,
            connection: OnceCell::new(),
        }
    }

    /// Creates a store from a `redis://` connection URL.
    pub fn open(url: &str) -> Result<Self, RedisError> {
        Ok(Self::new(Client::open(url)?))
    }

    /// Returns the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }

    async fn connection(&self) -> Result<MultiplexedConnection, RedisError> {
        let con = self
            .connection
            .get_or_try_init(|| async {
                debug!("redis store: opening multiplexed connection");
                self.client.get_multiplexed_async_connection().await
            })
            .await?;
        Ok(con.clone())
    }
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore")
            .field("connected", &self.connection.initialized())
            .finish_non_exhaustive()
    }
}

/// Converts a TTL to whole milliseconds for `PX`, rounding sub-millisecond
/// values up so they still expire instead of meaning "forever".
fn ttl_millis(ttl: Duration) -> u64 {
    let millis = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX);
    millis.max(1)
}

#[async_trait]
impl KeyValueStore for RedisStore {
    type Error = RedisError;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Self::Error> {
        let mut con = self.connection().await?;
        if ttl.is_zero() {
            con.set::<_, _, ()>(key, value).await
        } else {
            con.pset_ex::<_, _, ()>(key, value, ttl_millis(ttl)).await
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut con = self.connection().await?;
        con.get(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_millis_rounds_up() {
        assert_eq!(ttl_millis(Duration::from_micros(10)), 1);
        assert_eq!(ttl_millis(Duration::from_millis(1500)), 1500);
    }

    #[test]
    fn test_open_rejects_bad_url() {
        assert!(RedisStore::open("not a url").is_err());
    }

    #[test]
    fn test_open_is_lazy() {
        // Nothing listens on port 1; opening must still succeed.
        let store = RedisStore::open("redis://127.0.0.1:1/0").unwrap();
        assert!(!store.connection.initialized());
    }
}
