//! Subscriber catalogue
//!
//! Built once at startup from explicit registration calls; produces the
//! immutable event-kind -> subscriber-endpoint map the dispatcher fans out
//! with, plus one queue worker per subscription. No runtime registration,
//! no scanning.

use crate::subscriber::{Subscriber, SubscriberHandler};
use crate::worker::{QueueWorker, WorkerConfig};
use lookout_core::error::{LookoutError, Result};
use lookout_core::queue_name::subscriber_queue_name;
use lookout_core::registry::EventTypeRegistry;
use lookout_core::types::DomainEvent;
use lookout_core::{QueueProvider, Shutdown};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// One subscription's delivery target
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriberEndpoint {
    pub subscriber: &'static str,
    pub queue_name: String,
}

/// Immutable event-kind -> subscriber-endpoint map
#[derive(Debug, Default)]
pub struct SubscriberCatalogue {
    routes: HashMap<&'static str, Vec<SubscriberEndpoint>>,
}

impl SubscriberCatalogue {
    /// Endpoints interested in a kind; empty when nobody subscribed
    pub fn subscribers_for(&self, kind: &str) -> &[SubscriberEndpoint] {
        self.routes.get(kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn subscription_count(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }
}

/// Startup-time catalogue assembly
///
/// `register` declares an event kind with no subscribers (publishable and
/// dispatchable, fan-out of zero); `subscribe` declares a kind plus one
/// consumer of it.
pub struct CatalogueBuilder {
    registry: EventTypeRegistry,
    routes: HashMap<&'static str, Vec<SubscriberEndpoint>>,
    subscriptions: Vec<Box<dyn SubscriptionSpec>>,
}

impl CatalogueBuilder {
    pub fn new() -> Self {
        Self {
            registry: EventTypeRegistry::new(),
            routes: HashMap::new(),
            subscriptions: Vec::new(),
        }
    }

    /// Declare an event kind without attaching a subscriber
    pub fn register<E: DomainEvent>(mut self) -> Result<Self> {
        self.registry.register::<E>()?;
        Ok(self)
    }

    /// Declare a subscription of `S` to events of kind `E::KIND`
    pub fn subscribe<E: DomainEvent, S: Subscriber<E>>(
        mut self,
        subscriber: Arc<S>,
    ) -> Result<Self> {
        self.registry.register::<E>()?;

        let queue_name = subscriber_queue_name(S::NAME, E::KIND);
        let endpoint = SubscriberEndpoint {
            subscriber: S::NAME,
            queue_name,
        };
        let routes = self.routes.entry(E::KIND).or_default();
        if routes.contains(&endpoint) {
            return Err(LookoutError::Config(format!(
                "subscriber '{}' registered twice for kind '{}'",
                S::NAME,
                E::KIND
            )));
        }
        routes.push(endpoint);

        self.subscriptions.push(Box::new(Subscription::<E, S> {
            subscriber,
            _event: std::marker::PhantomData,
        }));
        Ok(self)
    }

    /// Materialize the registry, the catalogue and one worker per
    /// subscription, provisioning each subscriber's queue
    pub async fn build(
        self,
        provider: Arc<dyn QueueProvider>,
        config: WorkerConfig,
        shutdown: Shutdown,
    ) -> Result<(EventTypeRegistry, SubscriberCatalogue, Vec<QueueWorker>)> {
        let mut seen = HashSet::new();
        for endpoints in self.routes.values() {
            for endpoint in endpoints {
                if !seen.insert(endpoint.queue_name.clone()) {
                    return Err(LookoutError::Config(format!(
                        "queue name collision: '{}'",
                        endpoint.queue_name
                    )));
                }
            }
        }

        let mut workers = Vec::with_capacity(self.subscriptions.len());
        for spec in self.subscriptions {
            let queue = provider.queue(&spec.queue_name()).await?;
            workers.push(spec.into_worker(queue, config.clone(), shutdown.clone()));
        }

        let catalogue = SubscriberCatalogue {
            routes: self.routes,
        };
        Ok((self.registry, catalogue, workers))
    }
}

impl std::fmt::Debug for CatalogueBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogueBuilder")
            .field("registry", &self.registry)
            .field("routes", &self.routes)
            .field("subscriptions", &self.subscriptions.len())
            .finish()
    }
}

impl Default for CatalogueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

trait SubscriptionSpec: Send {
    fn queue_name(&self) -> String;

    fn into_worker(
        self: Box<Self>,
        queue: Arc<dyn lookout_core::Queue>,
        config: WorkerConfig,
        shutdown: Shutdown,
    ) -> QueueWorker;
}

struct Subscription<E, S> {
    subscriber: Arc<S>,
    _event: std::marker::PhantomData<fn(E)>,
}

impl<E: DomainEvent, S: Subscriber<E>> SubscriptionSpec for Subscription<E, S> {
    fn queue_name(&self) -> String {
        subscriber_queue_name(S::NAME, E::KIND)
    }

    fn into_worker(
        self: Box<Self>,
        queue: Arc<dyn lookout_core::Queue>,
        config: WorkerConfig,
        shutdown: Shutdown,
    ) -> QueueWorker {
        QueueWorker::new(
            queue,
            Arc::new(SubscriberHandler::<E, S>::new(self.subscriber)),
            config,
            shutdown,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::MembershipCategoryChanged;
    use async_trait::async_trait;

    struct Recorder;

    #[async_trait]
    impl Subscriber<MembershipCategoryChanged> for Recorder {
        const NAME: &'static str = "Recorder";

        async fn handle(&self, _event: MembershipCategoryChanged) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn duplicate_subscription_is_rejected() {
        let builder = CatalogueBuilder::new()
            .subscribe::<MembershipCategoryChanged, Recorder>(Arc::new(Recorder))
            .unwrap();

        let err = builder
            .subscribe::<MembershipCategoryChanged, Recorder>(Arc::new(Recorder))
            .unwrap_err();
        assert!(matches!(err, LookoutError::Config(_)));
    }
}
