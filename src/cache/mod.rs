//! Cache Module
//!
//! Cache-aside wrapper over a [`KvStore`](crate::store::KvStore): values are
//! stored as JSON, store failures degrade to misses, computation failures
//! pass straight through, and a computation that overruns its budget fails.

mod compute;
mod stats;


// Re-export public types
pub use compute::{CacheLookup, ComputeCache};
pub use stats::{CacheCounters, CacheStats};

// == Public Constants ==
/// TTL applied to tool results when none is configured (1 hour)
pub const DEFAULT_TTL_SECS: u64 = 3600;

/// Upper bound on a single store call
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 250;

/// Upper bound on a single cache-aside computation
pub const DEFAULT_COMPUTE_TIMEOUT_MS: u64 = 30_000;
