use crate::error::Result;
use crate::types::{DeadLetterRecord, QueueMessage};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Keyed message queue with visibility timeouts and a dead-letter sink
///
/// Receive does not remove a message; it hides it for the visibility
/// timeout. A message that is neither deleted nor dead-lettered becomes
/// visible again and is redelivered with an incremented dequeue count.
#[async_trait]
pub trait Queue: Send + Sync {
    /// Append a payload to the queue
    async fn enqueue(&self, payload: &str) -> Result<()>;

    /// Receive up to `max` visible messages, hiding each for `visibility`
    /// (transport default when `None`)
    async fn receive(
        &self,
        max: usize,
        visibility: Option<Duration>,
    ) -> Result<Vec<QueueMessage>>;

    /// Acknowledge a message, removing it permanently
    ///
    /// Requires the pop receipt from the most recent receive.
    async fn delete(&self, message: &QueueMessage) -> Result<()>;

    /// Append a record to the queue's dead-letter sink
    async fn dead_letter(&self, record: DeadLetterRecord) -> Result<()>;
}

/// Create-or-get named queues
///
/// Subscriber queues are provisioned on first use; names must already fit
/// the transport's constraints (see [`crate::queue_name`]).
#[async_trait]
pub trait QueueProvider: Send + Sync {
    async fn queue(&self, name: &str) -> Result<Arc<dyn Queue>>;
}
