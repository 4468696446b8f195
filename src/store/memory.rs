//! Memory Store Module
//!
//! In-process key-value store with per-key TTL, used when no external store
//! is configured and as the default backend in tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::store::{Clock, KvStore, StoreEntry, SystemClock, MAX_KEY_LENGTH};

// == Memory Store ==
/// HashMap-backed store with expiry and a hard entry cap.
#[derive(Debug)]
pub struct MemoryStore {
    /// Key-value storage
    entries: RwLock<HashMap<String, StoreEntry>>,
    /// Time source for expiry
    clock: Arc<dyn Clock>,
    /// Maximum number of entries allowed
    max_entries: usize,
}

impl MemoryStore {
    // == Constructor ==
    /// Creates a store on the system clock.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries the store can hold
    pub fn new(max_entries: usize) -> Self {
        Self::with_clock(max_entries, Arc::new(SystemClock))
    }

    /// Creates a store driven by the given clock.
    pub fn with_clock(max_entries: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            clock,
            max_entries: max_entries.max(1),
        }
    }

    // == Purge Expired ==
    /// Removes all expired entries, returning how many were dropped.
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    // == Length ==
    /// Returns the number of physically held entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    // == Is Empty ==
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drops the entry closest to expiry to make room for a new key.
    fn evict_one(entries: &mut HashMap<String, StoreEntry>) {
        let victim = entries
            .iter()
            .min_by_key(|(_, entry)| entry.expires_at)
            .map(|(key, _)| key.clone());

        if let Some(key) = victim {
            debug!(key = %key, "evicting entry to stay within capacity");
            entries.remove(&key);
        }
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let now = self.clock.now_ms();
        let entries = self.entries.read().await;

        Ok(entries
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone()))
    }

    async fn set_ex(&self, key: &str, ttl_secs: u64, value: Vec<u8>) -> Result<(), StoreError> {
        if key.is_empty() || key.len() > MAX_KEY_LENGTH {
            return Err(StoreError::InvalidKey(format!(
                "key must be 1..={} bytes",
                MAX_KEY_LENGTH
            )));
        }

        let now = self.clock.now_ms();
        let mut entries = self.entries.write().await;

        if !entries.contains_key(key) && entries.len() >= self.max_entries {
            entries.retain(|_, entry| !entry.is_expired(now));
            if entries.len() >= self.max_entries {
                Self::evict_one(&mut entries);
            }
        }

        entries.insert(key.to_string(), StoreEntry::new(value, ttl_secs, now));
        Ok(())
    }

    async fn del(&self, keys: &[String]) -> Result<usize, StoreError> {
        let mut entries = self.entries.write().await;
        Ok(keys.iter().filter(|key| entries.remove(*key).is_some()).count())
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError> {
        let matcher =
            glob::Pattern::new(pattern).map_err(|e| StoreError::InvalidKey(e.to_string()))?;

        let now = self.clock.now_ms();
        let entries = self.entries.read().await;

        let mut keys: Vec<String> = entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired(now) && matcher.matches(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }
}
