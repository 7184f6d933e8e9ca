//! Memory Store Module
//!
//! In-process key-value store with TTL expiration. Useful for tests and for
//! running the cache without a Redis server.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

use super::{KeyValueStore, StoredEntry};

// == Memory Store Error ==
/// Failure reported by a [`MemoryStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryStoreError {
    /// The store was switched offline with [`MemoryStore::set_unavailable`]
    #[error("memory store is unavailable")]
    Unavailable,
}

// == Memory Store ==
/// Shared in-memory store.
///
/// Clones share the same entries, so several caches (for example with
/// different version tags) can point at one store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    /// Key-value storage
    entries: Arc<RwLock<HashMap<String, StoredEntry>>>,
    /// When set, every operation fails
    unavailable: Arc<AtomicBool>,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // == Availability ==
    /// Simulates an outage: while set, `get` and `set` return
    /// [`MemoryStoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), MemoryStoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(MemoryStoreError::Unavailable)
        } else {
            Ok(())
        }
    }

    // == Raw Access ==
    /// Stores raw bytes under a physical key, bypassing any codec.
    pub async fn insert_raw(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        let entry = StoredEntry::new(value.into(), Duration::ZERO);
        self.entries.write().await.insert(key.into(), entry);
    }

    /// Returns the physical keys of all live entries, sorted.
    pub async fn keys(&self) -> Vec<String> {
        let entries = self.entries.read().await;
        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        keys
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let removed = before - entries.len();

        if removed > 0 {
            debug!(removed, "memory store: purged expired entries");
        }
        removed
    }

    // == Length ==
    /// Returns the number of stored entries, including expired ones not yet purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    /// Returns true if the store holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    type Error = MemoryStoreError;

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), Self::Error> {
        self.check_available()?;

        let entry = StoredEntry::new(value.as_bytes().to_vec(), ttl);
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Self::Error> {
        self.check_available()?;

        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: drop it unless a concurrent set replaced it meanwhile
        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(StoredEntry::is_expired) {
            entries.remove(key);
        }
        Ok(None)
    }
}
