//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::{DEFAULT_COMPUTE_TIMEOUT_MS, DEFAULT_STORE_TIMEOUT_MS, DEFAULT_TTL_SECS};
use crate::validation::DEFAULT_MAX_DOCUMENT_BYTES;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// TTL in seconds for cached tool results
    pub cache_ttl: u64,
    /// Upper bound on a single key-value store call, in milliseconds
    pub store_timeout_ms: u64,
    /// Upper bound on computing a cached tool result, in milliseconds
    pub compute_timeout_ms: u64,
    /// Maximum number of entries the in-memory store can hold
    pub store_max_entries: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Shared secret for verifying bearer tokens
    pub jwt_secret: String,
    /// Largest document accepted for analysis, in bytes
    pub max_document_bytes: u64,
    /// Deployment environment name, reported by the health check
    pub environment: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_port", &self.server_port)
            .field("cache_ttl", &self.cache_ttl)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("compute_timeout_ms", &self.compute_timeout_ms)
            .field("store_max_entries", &self.store_max_entries)
            .field("cleanup_interval", &self.cleanup_interval)
            .field("jwt_secret", &"<redacted>")
            .field("max_document_bytes", &self.max_document_bytes)
            .field("environment", &self.environment)
            .finish()
    }
}

fn parsed<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 8000)
    /// - `CACHE_TTL` - TTL for cached tool results in seconds (default: 3600)
    /// - `STORE_TIMEOUT_MS` - Store call timeout in milliseconds (default: 250)
    /// - `COMPUTE_TIMEOUT_MS` - Cached computation timeout in milliseconds (default: 30000)
    /// - `STORE_MAX_ENTRIES` - In-memory store capacity (default: 10000)
    /// - `CLEANUP_INTERVAL` - Expiry sweep frequency in seconds (default: 30)
    /// - `JWT_SECRET_KEY` - Token signing secret (default: "default_secret")
    /// - `MAX_DOCUMENT_BYTES` - Document size limit (default: 10 MiB)
    /// - `ENVIRONMENT` - Deployment name (default: "development")
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: parsed("SERVER_PORT", defaults.server_port),
            cache_ttl: parsed("CACHE_TTL", defaults.cache_ttl),
            store_timeout_ms: parsed("STORE_TIMEOUT_MS", defaults.store_timeout_ms),
            compute_timeout_ms: parsed("COMPUTE_TIMEOUT_MS", defaults.compute_timeout_ms),
            store_max_entries: parsed("STORE_MAX_ENTRIES", defaults.store_max_entries),
            cleanup_interval: parsed("CLEANUP_INTERVAL", defaults.cleanup_interval),
            jwt_secret: env::var("JWT_SECRET_KEY").unwrap_or(defaults.jwt_secret),
            max_document_bytes: parsed("MAX_DOCUMENT_BYTES", defaults.max_document_bytes),
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    pub fn compute_timeout(&self) -> Duration {
        Duration::from_millis(self.compute_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 8000,
            cache_ttl: DEFAULT_TTL_SECS,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            compute_timeout_ms: DEFAULT_COMPUTE_TIMEOUT_MS,
            store_max_entries: 10_000,
            cleanup_interval: 30,
            jwt_secret: "default_secret".to_string(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            environment: "development".to_string(),
        }
    }
}
