//! Compute Cache Module
//!
//! Get-or-compute-and-store over a shared key-value store.
//!
//! Key construction belongs to the caller: a key must cover every input that
//! affects the computed value, or two different requests will share a result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::cache::{
    CacheCounters, CacheStats, DEFAULT_COMPUTE_TIMEOUT_MS, DEFAULT_STORE_TIMEOUT_MS,
};
use crate::error::{ComputeTimeout, StoreError};
use crate::store::KvStore;

// == Cache Lookup ==
/// Outcome of reading a key, keeping store failures distinct from misses.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<T> {
    /// A live value was found and decoded
    Hit(T),
    /// The key is absent or expired
    Miss,
    /// The store failed or returned undecodable bytes
    StoreError(String),
}

impl<T> CacheLookup<T> {
    /// Collapses the lookup to a value, treating store errors as misses.
    pub fn into_option(self) -> Option<T> {
        match self {
            CacheLookup::Hit(value) => Some(value),
            CacheLookup::Miss | CacheLookup::StoreError(_) => None,
        }
    }
}

// == Compute Cache ==
/// Typed cache-aside layer with bounded store calls.
///
/// No single-flight: two callers missing on the same key at the same time
/// both compute and both write, last write wins.
pub struct ComputeCache {
    /// Backing store
    store: Arc<dyn KvStore>,
    /// Upper bound on each store call
    store_timeout: Duration,
    /// Upper bound on each computation run by `get_or_compute`
    compute_timeout: Duration,
    /// Hit/miss bookkeeping
    counters: CacheCounters,
}

impl ComputeCache {
    // == Constructor ==
    /// Creates a cache over `store` with the default store timeout.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_timeout(store, Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS))
    }

    /// Creates a cache whose store calls give up after `store_timeout`.
    pub fn with_timeout(store: Arc<dyn KvStore>, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
            compute_timeout: Duration::from_millis(DEFAULT_COMPUTE_TIMEOUT_MS),
            counters: CacheCounters::new(),
        }
    }

    /// Sets how long `get_or_compute` waits for a computation.
    pub fn with_compute_timeout(mut self, compute_timeout: Duration) -> Self {
        self.compute_timeout = compute_timeout;
        self
    }

    /// Runs a store call under the configured timeout.
    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        match tokio::time::timeout(self.store_timeout, op).await {
            Ok(result) => result,
            Err(_) => Err(StoreError::Timeout(self.store_timeout.as_millis() as u64)),
        }
    }

    // == Lookup ==
    /// Reads `key` and reports exactly what happened.
    pub async fn lookup<T: DeserializeOwned>(&self, key: &str) -> CacheLookup<T> {
        let outcome = match self.bounded(self.store.get(key)).await {
            Ok(Some(bytes)) => serde_json::from_slice::<T>(&bytes).map_err(StoreError::from),
            Ok(None) => {
                self.counters.record_miss();
                debug!(key = %key, "cache miss");
                return CacheLookup::Miss;
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok(value) => {
                self.counters.record_hit();
                debug!(key = %key, "cache hit");
                CacheLookup::Hit(value)
            }
            Err(e) => {
                self.counters.record_miss();
                self.counters.record_store_error();
                warn!(key = %key, error = %e, "cache read failed, treating as miss");
                CacheLookup::StoreError(e.to_string())
            }
        }
    }

    // == Get ==
    /// Returns the cached value for `key`, or `None` on miss or store failure.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.lookup(key).await.into_option()
    }

    // == Set ==
    /// Stores `value` under `key` for `ttl_secs` seconds.
    ///
    /// Returns `false` if the value could not be stored; never fails the caller.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) -> bool {
        let result = match serde_json::to_vec(value) {
            Ok(bytes) => self.bounded(self.store.set_ex(key, ttl_secs, bytes)).await,
            Err(e) => Err(StoreError::from(e)),
        };

        match result {
            Ok(()) => true,
            Err(e) => {
                self.counters.record_store_error();
                warn!(key = %key, error = %e, "cache write failed");
                false
            }
        }
    }

    // == Get Or Compute ==
    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// Errors from `compute` are returned unchanged and nothing is stored.
    /// A computation still running after the compute timeout is dropped and
    /// reported as [`ComputeTimeout`]. Storing the fresh value is best-effort.
    ///
    /// # Arguments
    /// * `key` - Cache key covering every input of `compute`
    /// * `compute` - Produces the value when the cache cannot
    /// * `ttl_secs` - Lifetime of the stored value
    pub async fn get_or_compute<T, E, F, Fut>(
        &self,
        key: &str,
        compute: F,
        ttl_secs: u64,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        E: From<ComputeTimeout>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let CacheLookup::Hit(value) = self.lookup(key).await {
            return Ok(value);
        }

        self.counters.record_computation();
        let value = match tokio::time::timeout(self.compute_timeout, compute()).await {
            Ok(result) => result?,
            Err(_) => {
                let limit_ms = self.compute_timeout.as_millis() as u64;
                warn!(key = %key, limit_ms, "computation timed out");
                return Err(ComputeTimeout(limit_ms).into());
            }
        };

        self.set(key, &value, ttl_secs).await;
        Ok(value)
    }

    // == Delete ==
    /// Removes `key`. Returns `false` only if the store call failed.
    pub async fn delete(&self, key: &str) -> bool {
        match self.bounded(self.store.del(&[key.to_string()])).await {
            Ok(_) => true,
            Err(e) => {
                self.counters.record_store_error();
                warn!(key = %key, error = %e, "cache delete failed");
                false
            }
        }
    }

    // == Clear Pattern ==
    /// Removes every key matching a glob pattern such as `doc_analysis:*`.
    pub async fn clear_pattern(&self, pattern: &str) -> bool {
        let result: Result<usize, StoreError> = async {
            let keys = self.bounded(self.store.keys(pattern)).await?;
            if keys.is_empty() {
                return Ok(0);
            }
            self.bounded(self.store.del(&keys)).await
        }
        .await;

        match result {
            Ok(removed) => {
                debug!(pattern = %pattern, removed, "cleared cache pattern");
                true
            }
            Err(e) => {
                self.counters.record_store_error();
                warn!(pattern = %pattern, error = %e, "cache pattern clear failed");
                false
            }
        }
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.counters.snapshot()
    }
}
