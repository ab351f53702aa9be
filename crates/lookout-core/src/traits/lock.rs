use crate::error::Result;
use crate::types::LockLease;
use async_trait::async_trait;
use std::time::Duration;

/// Acquisition behavior for a named lock
///
/// `wait == None` is a non-blocking attempt: contention returns a
/// non-acquired lease immediately. Otherwise the manager retries every
/// `retry` until `wait` elapses, then gives up.
#[derive(Debug, Clone, Default)]
pub struct LockOptions {
    pub expiry: Option<Duration>,
    pub wait: Option<Duration>,
    pub retry: Option<Duration>,
}

impl LockOptions {
    /// Skip-on-contention acquisition (the detector case)
    pub fn non_blocking() -> Self {
        Self::default()
    }

    /// Wait-with-retry-then-give-up acquisition (the generic case)
    pub fn wait_with_retry(wait: Duration, retry: Duration) -> Self {
        Self {
            expiry: None,
            wait: Some(wait),
            retry: Some(retry),
        }
    }

    pub fn with_expiry(mut self, expiry: Duration) -> Self {
        self.expiry = Some(expiry);
        self
    }
}

/// Cross-process mutual exclusion keyed by a caller-chosen resource string
///
/// Callers own collision-avoidance of resource names (e.g.
/// `detector:{name}:{scope_key}`). Two concurrent acquisitions of the same
/// resource never both report acquired.
#[async_trait]
pub trait LockManager: Send + Sync {
    async fn acquire(&self, resource: &str, options: LockOptions) -> Result<LockLease>;
}
