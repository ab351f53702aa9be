use chrono::{DateTime, Utc};
use std::fmt;

/// Result of a lock acquisition attempt
///
/// A lease that reports `is_acquired() == false` holds nothing and releases
/// nothing. An acquired lease releases the underlying lock when dropped, on
/// every exit path (success, error, cancellation).
pub struct LockLease {
    resource: String,
    acquired: bool,
    expires_at: Option<DateTime<Utc>>,
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockLease {
    /// An acquired lease; `release` runs exactly once, on drop.
    pub fn acquired(
        resource: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
        release: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            resource: resource.into(),
            acquired: true,
            expires_at,
            release: Some(Box::new(release)),
        }
    }

    /// A lease that lost the acquisition race. Not an error.
    pub fn contended(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            acquired: false,
            expires_at: None,
            release: None,
        }
    }

    pub fn is_acquired(&self) -> bool {
        self.acquired
    }

    pub fn resource(&self) -> &str {
        &self.resource
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl Drop for LockLease {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for LockLease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockLease")
            .field("resource", &self.resource)
            .field("acquired", &self.acquired)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn acquired_lease_releases_on_drop() {
        let released = Arc::new(AtomicUsize::new(0));
        let counter = released.clone();

        let lease = LockLease::acquired("detector:test:1", None, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(lease.is_acquired());
        assert_eq!(released.load(Ordering::SeqCst), 0);

        drop(lease);
        assert_eq!(released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn contended_lease_releases_nothing() {
        let lease = LockLease::contended("detector:test:1");
        assert!(!lease.is_acquired());
        drop(lease);
    }
}
