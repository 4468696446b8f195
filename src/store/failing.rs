//! Failing Store Module
//!
//! A store that rejects every call, for exercising outage handling.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::KvStore;

/// Store whose every operation fails with [`StoreError::Unavailable`].
#[derive(Debug, Clone, Default)]
pub struct FailingStore;

fn refused() -> StoreError {
    StoreError::Unavailable("connection refused".to_string())
}

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Err(refused())
    }

    async fn set_ex(&self, _key: &str, _ttl_secs: u64, _value: Vec<u8>) -> Result<(), StoreError> {
        Err(refused())
    }

    async fn del(&self, _keys: &[String]) -> Result<usize, StoreError> {
        Err(refused())
    }

    async fn keys(&self, _pattern: &str) -> Result<Vec<String>, StoreError> {
        Err(refused())
    }
}
