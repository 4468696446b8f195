//! Store Entry Module
//!
//! A single serialized value held by the in-memory store, with its expiry.

// == Store Entry ==
/// Represents a stored payload and its lifetime.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Serialized payload
    pub value: Vec<u8>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl StoreEntry {
    // == Constructor ==
    /// Creates an entry that lives for `ttl_seconds` from `now_ms`.
    ///
    /// # Arguments
    /// * `value` - The serialized payload
    /// * `ttl_seconds` - Lifetime in seconds
    /// * `now_ms` - Current time in Unix milliseconds
    pub fn new(value: Vec<u8>, ttl_seconds: u64, now_ms: u64) -> Self {
        Self {
            value,
            created_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_seconds.saturating_mul(1000)),
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is past its expiry at `now_ms`.
    ///
    /// An entry is only visible while `now_ms < expires_at`, so the entry is
    /// expired from the exact millisecond its TTL has fully elapsed.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }
}
