//! Event publisher
//!
//! Persists then enqueues, in that order. A crash between the append and
//! the enqueue loses the dispatch but never the record; the pipeline is
//! at-least-once, and recovery of a lost enqueue is an external replay
//! concern. There is no publish-time dedup - callers (detectors) own
//! idempotency, typically via [`crate::EventStore::exists`].

use crate::event_store::EventStore;
use lookout_core::error::Result;
use lookout_core::types::{DomainEvent, Envelope};
use lookout_core::Queue;
use std::sync::Arc;
use tracing::debug;

/// Name of the main dispatch queue
pub const DISPATCH_QUEUE: &str = "lookout-dispatch";

pub struct EventPublisher {
    store: Arc<EventStore>,
    dispatch_queue: Arc<dyn Queue>,
}

impl EventPublisher {
    pub fn new(store: Arc<EventStore>, dispatch_queue: Arc<dyn Queue>) -> Self {
        Self {
            store,
            dispatch_queue,
        }
    }

    /// Persist and enqueue one event
    pub async fn publish<E: DomainEvent>(&self, event: &E) -> Result<()> {
        let envelope = Envelope::from_event(event)?;
        self.publish_envelope(&envelope).await
    }

    /// Persist and enqueue a pre-built envelope (detector sink path)
    pub async fn publish_envelope(&self, envelope: &Envelope) -> Result<()> {
        self.store.append(envelope).await?;
        self.dispatch_queue.enqueue(&envelope.to_json()?).await?;
        debug!(
            event_id = %envelope.event_id,
            kind = %envelope.kind,
            scope = %envelope.scope_id,
            "event published"
        );
        Ok(())
    }
}
