//! Event dispatcher
//!
//! The single logical consumer of the main dispatch queue. Fans each
//! envelope out to every interested subscriber queue; the source message is
//! acked only once all per-subscriber enqueues succeed, so a mid-fan-out
//! failure leaves it for redelivery. Redelivery can duplicate enqueues to
//! subscribers that already received the envelope - consumers tolerate
//! duplicate event ids.

use crate::catalogue::SubscriberCatalogue;
use crate::worker::{QueueHandler, QueueWorker, WorkerConfig};
use async_trait::async_trait;
use lookout_core::error::{LookoutError, Result};
use lookout_core::registry::EventTypeRegistry;
use lookout_core::types::Envelope;
use lookout_core::{Queue, QueueProvider, Shutdown};
use std::sync::Arc;
use tracing::debug;

/// Fan-out handling for one dispatch-queue payload
pub struct DispatchHandler {
    registry: Arc<EventTypeRegistry>,
    catalogue: Arc<SubscriberCatalogue>,
    provider: Arc<dyn QueueProvider>,
}

impl DispatchHandler {
    pub fn new(
        registry: Arc<EventTypeRegistry>,
        catalogue: Arc<SubscriberCatalogue>,
        provider: Arc<dyn QueueProvider>,
    ) -> Self {
        Self {
            registry,
            catalogue,
            provider,
        }
    }
}

#[async_trait]
impl QueueHandler for DispatchHandler {
    fn name(&self) -> &str {
        "dispatcher"
    }

    async fn handle(&self, payload: &str) -> Result<()> {
        let envelope = Envelope::from_json(payload)?;

        // An unregistered kind will never become routable; quarantine now
        if self.registry.resolve(&envelope.kind).is_none() {
            return Err(LookoutError::Unroutable(format!(
                "unknown event kind '{}'",
                envelope.kind
            )));
        }

        let endpoints = self.catalogue.subscribers_for(&envelope.kind);
        for endpoint in endpoints {
            let queue = self.provider.queue(&endpoint.queue_name).await?;
            queue.enqueue(payload).await?;
            debug!(
                event_id = %envelope.event_id,
                kind = %envelope.kind,
                subscriber = endpoint.subscriber,
                "envelope fanned out"
            );
        }
        Ok(())
    }
}

/// The dispatch poll loop: a [`QueueWorker`] over the main dispatch queue
pub struct EventDispatcher {
    worker: QueueWorker,
}

impl EventDispatcher {
    pub fn new(
        dispatch_queue: Arc<dyn Queue>,
        registry: Arc<EventTypeRegistry>,
        catalogue: Arc<SubscriberCatalogue>,
        provider: Arc<dyn QueueProvider>,
        config: WorkerConfig,
        shutdown: Shutdown,
    ) -> Self {
        let handler = Arc::new(DispatchHandler::new(registry, catalogue, provider));
        Self {
            worker: QueueWorker::new(dispatch_queue, handler, config, shutdown),
        }
    }

    /// Run until shutdown is signaled
    pub async fn run(&self) {
        self.worker.run().await
    }

    /// One poll cycle (used by hosts that multiplex their own loop)
    pub async fn poll_once(&self) -> Result<crate::worker::PollOutcome> {
        self.worker.poll_once().await
    }
}
