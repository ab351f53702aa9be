//! Detector framework
//!
//! A detector evaluates a condition over a set of scopes and emits events
//! when it newly holds. Concrete detectors implement [`Detect`];
//! [`DetectorRunner`] supplies the machinery around them: per-scope
//! distributed locking (skip on contention), persisted state, event
//! publication, bounded cross-scope concurrency and per-scope failure
//! isolation. Schedulers and the trigger processor drive detectors through
//! the object-safe [`Detector`] contract.

use crate::publisher::EventPublisher;
use crate::state_store::DetectorStateStore;
use async_trait::async_trait;
use futures::future::join_all;
use lookout_core::error::Result;
use lookout_core::types::{DomainEvent, Envelope};
use lookout_core::{LockManager, LockOptions};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Default bound on concurrent per-scope evaluations within one run
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;

const DEFAULT_LOCK_EXPIRY: Duration = Duration::from_secs(60);

/// Collects the events one scope evaluation decides to emit
#[derive(Default)]
pub struct EventSink {
    events: Vec<Envelope>,
}

impl EventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an event for publication after the evaluation completes
    pub fn emit<E: DomainEvent>(&mut self, event: &E) -> Result<()> {
        self.events.push(Envelope::from_event(event)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn into_events(self) -> Vec<Envelope> {
        self.events
    }
}

/// When a detector runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectorSchedule {
    /// 5-field cron expression (minute resolution), evaluated in UTC
    pub cron: String,
    /// Fire once on the scheduler's first tick regardless of the cron
    pub run_on_startup: bool,
}

/// A concrete detection: condition, scope set, schedule
#[async_trait]
pub trait Detect: Send + Sync + 'static {
    /// Persisted per-scope state
    type State: Serialize + DeserializeOwned + Default + Send + Sync;
    /// Unit of evaluation (a member, an application, ...)
    type Scope: Send + Sync;

    /// Stable detector name; keys state rows, lock resources and triggers
    fn name(&self) -> &'static str;

    fn cron(&self) -> &str;

    fn run_on_startup(&self) -> bool {
        false
    }

    fn max_concurrency(&self) -> usize {
        DEFAULT_MAX_CONCURRENCY
    }

    /// Candidate scopes for a full run
    async fn scopes(&self) -> Result<Vec<Self::Scope>> {
        Ok(Vec::new())
    }

    /// State-row / lock-resource key for a scope
    fn scope_key(&self, scope: &Self::Scope) -> String;

    /// Resolve a key back to a scope for an ad-hoc single-scope run
    async fn scope_for_key(&self, key: &str) -> Result<Self::Scope>;

    /// Inspect current data for one scope; append newly-true conditions to
    /// the sink, optionally mutating the persisted state
    async fn detect(
        &self,
        scope: &Self::Scope,
        state: &mut Self::State,
        sink: &mut EventSink,
    ) -> Result<()>;
}

/// Object-safe detector contract driven by the scheduler and triggers
#[async_trait]
pub trait Detector: Send + Sync {
    fn name(&self) -> &str;

    fn schedule(&self) -> DetectorSchedule;

    /// Evaluate every candidate scope
    async fn run_all(&self) -> Result<()>;

    /// Ad-hoc re-evaluation of a single scope
    async fn run_for_scope(&self, scope_key: &str) -> Result<()>;
}

/// Framework machinery wrapping one [`Detect`] implementation
pub struct DetectorRunner<D: Detect> {
    detector: Arc<D>,
    locks: Arc<dyn LockManager>,
    state_store: Arc<DetectorStateStore>,
    publisher: Arc<EventPublisher>,
    lock_expiry: Duration,
}

impl<D: Detect> DetectorRunner<D> {
    pub fn new(
        detector: Arc<D>,
        locks: Arc<dyn LockManager>,
        state_store: Arc<DetectorStateStore>,
        publisher: Arc<EventPublisher>,
    ) -> Self {
        Self {
            detector,
            locks,
            state_store,
            publisher,
            lock_expiry: DEFAULT_LOCK_EXPIRY,
        }
    }

    pub fn with_lock_expiry(mut self, lock_expiry: Duration) -> Self {
        self.lock_expiry = lock_expiry;
        self
    }

    /// Evaluate one scope under its distributed lock
    ///
    /// Returns `Ok(false)` when the lock was contended and the scope was
    /// skipped for this cycle; the condition is re-checked next cycle.
    async fn process_scope(&self, scope: &D::Scope) -> Result<bool> {
        let name = self.detector.name();
        let key = self.detector.scope_key(scope);
        let resource = format!("detector:{}:{}", name, key);

        let lease = self
            .locks
            .acquire(
                &resource,
                LockOptions::non_blocking().with_expiry(self.lock_expiry),
            )
            .await?;
        if !lease.is_acquired() {
            debug!(detector = name, scope = %key, "scope locked elsewhere, skipping");
            return Ok(false);
        }

        let stored = self.state_store.load::<D::State>(name, &key).await?;
        let mut state = stored.map(|s| s.state).unwrap_or_default();

        let mut sink = EventSink::new();
        self.detector.detect(scope, &mut state, &mut sink).await?;

        let events = sink.into_events();
        if !events.is_empty() {
            debug!(detector = name, scope = %key, events = events.len(), "detector emitted");
        }
        for envelope in &events {
            self.publisher.publish_envelope(envelope).await?;
        }

        self.state_store.save(name, &key, &state).await?;
        Ok(true)
        // lease drops here; the lock is released on every exit path
    }
}

#[async_trait]
impl<D: Detect> Detector for DetectorRunner<D> {
    fn name(&self) -> &str {
        self.detector.name()
    }

    fn schedule(&self) -> DetectorSchedule {
        DetectorSchedule {
            cron: self.detector.cron().to_string(),
            run_on_startup: self.detector.run_on_startup(),
        }
    }

    async fn run_all(&self) -> Result<()> {
        let name = self.detector.name();
        let scopes = self.detector.scopes().await?;
        info!(detector = name, scopes = scopes.len(), "detector run starting");

        let semaphore = Arc::new(Semaphore::new(self.detector.max_concurrency().max(1)));
        let results = join_all(scopes.iter().map(|scope| {
            let semaphore = semaphore.clone();
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return 0usize;
                };
                match self.process_scope(scope).await {
                    Ok(_) => 0,
                    Err(e) => {
                        // Isolated: one scope's failure never aborts siblings
                        warn!(
                            detector = name,
                            scope = %self.detector.scope_key(scope),
                            error = %e,
                            "scope evaluation failed"
                        );
                        1
                    }
                }
            }
        }))
        .await;

        let failures: usize = results.into_iter().sum();
        info!(detector = name, failures, "detector run complete");
        Ok(())
    }

    async fn run_for_scope(&self, scope_key: &str) -> Result<()> {
        let scope = self.detector.scope_for_key(scope_key).await?;
        if !self.process_scope(&scope).await? {
            warn!(
                detector = self.detector.name(),
                scope = %scope_key,
                "requested run skipped, scope locked elsewhere"
            );
        }
        Ok(())
    }
}
