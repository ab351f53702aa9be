//! Shared shutdown signal
//!
//! Every poll loop and backoff delay in the pipeline races this signal so a
//! host can stop promptly. In-flight work either completes or is abandoned;
//! abandoned messages simply become visible again later, which is safe
//! under at-least-once delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::info;

/// Cloneable shutdown signal shared by all pipeline loops
#[derive(Clone, Default)]
pub struct Shutdown {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    triggered: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal shutdown; wakes every pending [`Shutdown::sleep`]
    pub fn trigger(&self) {
        if !self.inner.triggered.swap(true, Ordering::SeqCst) {
            info!("shutdown signaled");
        }
        self.inner.notify.notify_waiters();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Sleep for `duration`, waking early on shutdown
    ///
    /// Returns `true` when the full duration elapsed, `false` when the
    /// sleep was cut short by shutdown.
    pub async fn sleep(&self, duration: Duration) -> bool {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_triggered() {
            return false;
        }

        tokio::select! {
            _ = &mut notified => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn sleep_runs_to_completion_without_trigger() {
        let shutdown = Shutdown::new();
        assert!(shutdown.sleep(Duration::from_millis(10)).await);
        assert!(!shutdown.is_triggered());
    }

    #[tokio::test]
    async fn trigger_cuts_sleep_short() {
        let shutdown = Shutdown::new();
        let waiter = shutdown.clone();

        let handle = tokio::spawn(async move { waiter.sleep(Duration::from_secs(30)).await });
        tokio::time::sleep(Duration::from_millis(20)).await;

        let start = Instant::now();
        shutdown.trigger();
        assert!(!handle.await.unwrap());
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn sleep_after_trigger_returns_immediately() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        assert!(!shutdown.sleep(Duration::from_secs(30)).await);
    }
}
