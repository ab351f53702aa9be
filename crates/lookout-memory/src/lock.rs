//! In-memory named lock manager

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use lookout_core::error::Result;
use lookout_core::traits::{LockManager, LockOptions};
use lookout_core::types::LockLease;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

const DEFAULT_RETRY: Duration = Duration::from_millis(50);

struct Held {
    token: u64,
    expires_at: Option<DateTime<Utc>>,
}

/// In-process [`LockManager`] implementation
///
/// Each held lock carries a fencing token so a lease whose lock expired and
/// was re-acquired elsewhere cannot release the new holder on drop.
#[derive(Default)]
pub struct MemoryLockManager {
    held: Arc<Mutex<HashMap<String, Held>>>,
    next_token: Mutex<u64>,
}

impl MemoryLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Is the resource currently held (and unexpired)?
    pub fn is_held(&self, resource: &str) -> bool {
        let held = self.held.lock();
        held.get(resource)
            .is_some_and(|h| h.expires_at.is_none_or(|at| at > Utc::now()))
    }

    fn try_acquire(&self, resource: &str, expiry: Option<Duration>) -> Option<LockLease> {
        let now = Utc::now();
        let mut held = self.held.lock();

        if let Some(existing) = held.get(resource) {
            let expired = existing.expires_at.is_some_and(|at| at <= now);
            if !expired {
                return None;
            }
        }

        let token = {
            let mut next = self.next_token.lock();
            *next += 1;
            *next
        };
        let expires_at = expiry
            .and_then(|e| ChronoDuration::from_std(e).ok())
            .map(|e| now + e);
        held.insert(resource.to_string(), Held { token, expires_at });

        let map = self.held.clone();
        let key = resource.to_string();
        Some(LockLease::acquired(resource, expires_at, move || {
            let mut held = map.lock();
            // Release only if this lease still owns the lock
            if held.get(&key).is_some_and(|h| h.token == token) {
                held.remove(&key);
            }
        }))
    }
}

#[async_trait]
impl LockManager for MemoryLockManager {
    async fn acquire(&self, resource: &str, options: LockOptions) -> Result<LockLease> {
        if let Some(lease) = self.try_acquire(resource, options.expiry) {
            return Ok(lease);
        }

        let Some(wait) = options.wait else {
            // Non-blocking attempt: contention is a skip, not an error
            return Ok(LockLease::contended(resource));
        };

        let retry = options.retry.unwrap_or(DEFAULT_RETRY);
        let deadline = Instant::now() + wait;
        while Instant::now() < deadline {
            tokio::time::sleep(retry).await;
            if let Some(lease) = self.try_acquire(resource, options.expiry) {
                return Ok(lease);
            }
        }
        Ok(LockLease::contended(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_non_blocking_acquisition_loses() {
        let locks = MemoryLockManager::new();
        let first = locks.acquire("r", LockOptions::non_blocking()).await.unwrap();
        assert!(first.is_acquired());

        let second = locks.acquire("r", LockOptions::non_blocking()).await.unwrap();
        assert!(!second.is_acquired());

        drop(first);
        let third = locks.acquire("r", LockOptions::non_blocking()).await.unwrap();
        assert!(third.is_acquired());
    }

    #[tokio::test]
    async fn waiting_acquisition_gives_up_after_wait() {
        let locks = MemoryLockManager::new();
        let _held = locks.acquire("r", LockOptions::non_blocking()).await.unwrap();

        let start = Instant::now();
        let lease = locks
            .acquire(
                "r",
                LockOptions::wait_with_retry(Duration::from_millis(100), Duration::from_millis(20)),
            )
            .await
            .unwrap();
        assert!(!lease.is_acquired());
        assert!(start.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test]
    async fn waiting_acquisition_succeeds_once_released() {
        let locks = Arc::new(MemoryLockManager::new());
        let held = locks.acquire("r", LockOptions::non_blocking()).await.unwrap();

        let waiter = locks.clone();
        let handle = tokio::spawn(async move {
            waiter
                .acquire(
                    "r",
                    LockOptions::wait_with_retry(Duration::from_secs(2), Duration::from_millis(10)),
                )
                .await
                .unwrap()
        });

        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(held);

        let lease = handle.await.unwrap();
        assert!(lease.is_acquired());
    }

    #[tokio::test]
    async fn expired_lock_can_be_reacquired_and_stale_release_is_ignored() {
        let locks = MemoryLockManager::new();
        let stale = locks
            .acquire(
                "r",
                LockOptions::non_blocking().with_expiry(Duration::from_millis(10)),
            )
            .await
            .unwrap();
        assert!(stale.is_acquired());

        tokio::time::sleep(Duration::from_millis(30)).await;

        let fresh = locks.acquire("r", LockOptions::non_blocking()).await.unwrap();
        assert!(fresh.is_acquired());

        // Dropping the expired lease must not release the new holder
        drop(stale);
        assert!(locks.is_held("r"));
        drop(fresh);
        assert!(!locks.is_held("r"));
    }

    #[tokio::test]
    async fn concurrent_acquisitions_have_one_winner() {
        let locks = Arc::new(MemoryLockManager::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let locks = locks.clone();
            handles.push(tokio::spawn(async move {
                let lease = locks.acquire("r", LockOptions::non_blocking()).await.unwrap();
                let won = lease.is_acquired();
                if won {
                    // Hold briefly so the race is observable
                    tokio::time::sleep(Duration::from_millis(20)).await;
                }
                won
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
