//! Subscriber contract and per-subscriber queue handler

use crate::worker::QueueHandler;
use async_trait::async_trait;
use lookout_core::error::Result;
use lookout_core::types::{DomainEvent, Envelope};
use std::marker::PhantomData;
use std::sync::Arc;

/// A consumer of one event kind
///
/// Each subscriber type gets its own isolated queue and dead-letter sink,
/// so one broken or slow subscriber never blocks delivery to the others.
///
/// Delivery is at-least-once: a retried dispatch can enqueue a second copy
/// of an envelope, so duplicates share an `event_id` and implementations
/// needing exactly-once effects must dedupe on it.
#[async_trait]
pub trait Subscriber<E: DomainEvent>: Send + Sync + 'static {
    /// Stable subscriber identity; feeds the queue-name derivation
    const NAME: &'static str;

    /// Process one event; a returned error is a transient failure and the
    /// delivery will be retried
    async fn handle(&self, event: E) -> Result<()>;
}

/// Adapts a [`Subscriber`] to the generic [`QueueHandler`] loop
pub(crate) struct SubscriberHandler<E, S> {
    subscriber: Arc<S>,
    label: String,
    _event: PhantomData<fn(E)>,
}

impl<E: DomainEvent, S: Subscriber<E>> SubscriberHandler<E, S> {
    pub(crate) fn new(subscriber: Arc<S>) -> Self {
        Self {
            subscriber,
            label: format!("{}[{}]", S::NAME, E::KIND),
            _event: PhantomData,
        }
    }
}

#[async_trait]
impl<E: DomainEvent, S: Subscriber<E>> QueueHandler for SubscriberHandler<E, S> {
    fn name(&self) -> &str {
        &self.label
    }

    async fn handle(&self, payload: &str) -> Result<()> {
        let envelope = Envelope::from_json(payload)?;
        let event: E = envelope.open()?;
        self.subscriber.handle(event).await
    }
}
