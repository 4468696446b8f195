//! Expiry Sweep Task
//!
//! Reads already ignore expired entries; the sweep reclaims their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a background task that periodically purges expired store entries.
///
/// # Arguments
/// * `store` - Shared in-memory store
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_cleanup_task(store: Arc<MemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.purge_expired().await;
            if removed > 0 {
                info!("Expiry sweep: removed {} entries", removed);
            } else {
                debug!("Expiry sweep: nothing to remove");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{KvStore, ManualClock};

    fn store_with_clock() -> (Arc<MemoryStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let store = Arc::new(MemoryStore::with_clock(100, clock.clone()));
        (store, clock)
    }

    #[tokio::test]
    async fn test_sweep_removes_expired_entries() {
        let (store, clock) = store_with_clock();
        store.set_ex("short", 1, b"v".to_vec()).await.unwrap();
        store.set_ex("long", 3600, b"v".to_vec()).await.unwrap();
        clock.advance(Duration::from_secs(2));

        // Expired entries stay in memory until swept
        assert_eq!(store.len().await, 2);

        let handle = spawn_cleanup_task(store.clone(), 1);
        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(store.len().await, 1);
        assert_eq!(store.get("long").await.unwrap(), Some(b"v".to_vec()));

        handle.abort();
    }

    #[tokio::test]
    async fn test_sweep_can_be_aborted() {
        let (store, _clock) = store_with_clock();

        let handle = spawn_cleanup_task(store, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished(), "Task should be finished after abort");
    }
}
