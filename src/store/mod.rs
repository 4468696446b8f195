//! Store Module
//!
//! The key-value store boundary consumed by the compute cache.
//!
//! A store speaks exactly four primitives: `GET`, `SETEX`, `DEL` and `KEYS`.
//! Serialization and failure handling live one layer up in
//! [`crate::cache::ComputeCache`].

mod clock;
mod entry;
mod failing;
mod memory;

use async_trait::async_trait;

pub use clock::{Clock, ManualClock, SystemClock};
pub use entry::StoreEntry;
pub use failing::FailingStore;
pub use memory::MemoryStore;

use crate::error::StoreError;

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 512;

// == Store Trait ==
/// Minimal key-value store with per-key expiry.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Returns the raw bytes for `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Stores `value` under `key`, expiring `ttl_secs` seconds from now.
    async fn set_ex(&self, key: &str, ttl_secs: u64, value: Vec<u8>) -> Result<(), StoreError>;

    /// Removes the given keys, returning how many existed.
    async fn del(&self, keys: &[String]) -> Result<usize, StoreError>;

    /// Lists live keys matching a glob-style pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>, StoreError>;
}
