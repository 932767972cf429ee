//! Per-asset lock registry
//!
//! Serializes the availability check and the decrement of one asset across
//! concurrent checkouts in this process. Locks are always taken in sorted id
//! order so two requests naming the same assets cannot deadlock.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::DomainError;

pub struct AssetLocks {
    locks: DashMap<String, Arc<Mutex<()>>>,
    timeout: Duration,
}

/// Held locks; dropping it releases every asset
#[must_use = "locks are released as soon as the guard is dropped"]
pub struct AssetGuard {
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl AssetLocks {
    pub fn new(timeout: Duration) -> Self {
        Self {
            locks: DashMap::new(),
            timeout,
        }
    }

    /// Acquire the locks of every distinct asset id, each within the configured timeout
    pub async fn acquire<'a, I>(&self, asset_ids: I) -> Result<AssetGuard, DomainError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ids: Vec<&str> = asset_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();

        let mut guards = Vec::with_capacity(ids.len());
        for id in ids {
            let lock = Arc::clone(self.locks.entry(id.to_owned()).or_default().value());

            let guard = tokio::time::timeout(self.timeout, lock.lock_owned())
                .await
                .map_err(|_| DomainError::Timeout {
                    asset_id: id.to_owned(),
                })?;
            guards.push(guard);
        }

        Ok(AssetGuard { _guards: guards })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_ids_do_not_self_deadlock() {
        let locks = AssetLocks::new(Duration::from_millis(50));
        let guard = locks.acquire(["A", "B", "A"]).await;
        assert!(guard.is_ok());
    }

    #[tokio::test]
    async fn test_held_lock_times_out_second_caller() {
        let locks = AssetLocks::new(Duration::from_millis(20));
        let _held = locks.acquire(["A"]).await.expect("first acquire");

        let second = locks.acquire(["B", "A"]).await;
        assert!(matches!(second, Err(DomainError::Timeout { ref asset_id }) if asset_id == "A"));
    }

    #[tokio::test]
    async fn test_lock_released_on_drop() {
        let locks = AssetLocks::new(Duration::from_millis(20));
        {
            let _held = locks.acquire(["A"]).await.expect("first acquire");
        }
        assert!(locks.acquire(["A"]).await.is_ok());
    }
}
