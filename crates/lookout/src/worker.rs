//! Generic retry/dead-letter queue worker
//!
//! The shared poll-process-ack shape every background consumer in the
//! pipeline is built on: the dispatcher, each subscriber, and the ad-hoc
//! trigger processor all drive a [`QueueWorker`] with their own
//! [`QueueHandler`].
//!
//! Outcome per message:
//! - handler `Ok` - delete (ack)
//! - `Malformed` - delete immediately; an unreadable payload can never
//!   succeed on retry
//! - `Unroutable` - dead-letter plus delete; not a transient fault
//! - dequeue count past the attempt budget - dead-letter plus delete
//! - any other error - leave the message for natural redelivery and sleep
//!   `2^attempts` seconds (capped) before the next poll
//!
//! Empty polls sleep a fixed idle interval. Every sleep races the shared
//! shutdown signal, and the loop never terminates because of one failure.

use async_trait::async_trait;
use lookout_core::error::{LookoutError, Result};
use lookout_core::types::{DeadLetterRecord, QueueMessage};
use lookout_core::{Queue, Shutdown};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Domain handling for one queue's payloads
#[async_trait]
pub trait QueueHandler: Send + Sync {
    /// Worker identity for logs
    fn name(&self) -> &str;

    /// Handle one payload; the error variant chooses the retry path
    async fn handle(&self, payload: &str) -> Result<()>;
}

/// Poll-loop configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum messages per receive
    pub batch_size: usize,
    /// Deliveries before a message is quarantined as poison
    pub max_attempts: u32,
    /// Sleep after an empty poll
    pub idle_delay: Duration,
    /// Visibility timeout passed to receive (transport default when `None`)
    pub visibility: Option<Duration>,
    /// Upper bound on the exponential backoff sleep
    pub max_backoff: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            batch_size: 32,
            max_attempts: 5,
            idle_delay: Duration::from_secs(10),
            visibility: None,
            max_backoff: Duration::from_secs(300),
        }
    }
}

impl WorkerConfig {
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_idle_delay(mut self, idle_delay: Duration) -> Self {
        self.idle_delay = idle_delay;
        self
    }

    pub fn with_visibility(mut self, visibility: Duration) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }
}

/// Result of one poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    /// Messages settled this cycle (acked, dropped or dead-lettered)
    pub settled: usize,
    /// Backoff requested by a transient failure, if any
    pub backoff: Option<Duration>,
}

/// Long-running single-consumer poll loop over one queue
pub struct QueueWorker {
    queue: Arc<dyn Queue>,
    handler: Arc<dyn QueueHandler>,
    config: WorkerConfig,
    shutdown: Shutdown,
}

impl QueueWorker {
    pub fn new(
        queue: Arc<dyn Queue>,
        handler: Arc<dyn QueueHandler>,
        config: WorkerConfig,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            queue,
            handler,
            config,
            shutdown,
        }
    }

    /// Run until shutdown is signaled
    pub async fn run(&self) {
        info!(worker = self.handler.name(), "queue worker started");

        while !self.shutdown.is_triggered() {
            let outcome = match self.poll_once().await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(worker = self.handler.name(), error = %e, "receive failed");
                    if !self.shutdown.sleep(self.config.idle_delay).await {
                        break;
                    }
                    continue;
                }
            };

            let delay = match outcome.backoff {
                Some(backoff) => Some(backoff),
                None if outcome.settled == 0 => Some(self.config.idle_delay),
                None => None,
            };
            if let Some(delay) = delay {
                if !self.shutdown.sleep(delay).await {
                    break;
                }
            }
        }

        info!(worker = self.handler.name(), "queue worker stopped");
    }

    /// Receive and settle one batch
    ///
    /// A transient handler failure stops the batch and reports a backoff;
    /// the failed message and the rest of the batch surface again after
    /// their visibility timeouts.
    pub async fn poll_once(&self) -> Result<PollOutcome> {
        let batch = self
            .queue
            .receive(self.config.batch_size, self.config.visibility)
            .await?;

        let mut outcome = PollOutcome {
            settled: 0,
            backoff: None,
        };
        for message in &batch {
            if self.shutdown.is_triggered() {
                break;
            }
            match self.settle(message).await {
                None => outcome.settled += 1,
                Some(backoff) => {
                    outcome.backoff = Some(backoff);
                    break;
                }
            }
        }
        Ok(outcome)
    }

    /// Settle one message; `Some(backoff)` means it was left for redelivery
    async fn settle(&self, message: &QueueMessage) -> Option<Duration> {
        if message.dequeue_count > self.config.max_attempts {
            warn!(
                worker = self.handler.name(),
                message_id = %message.message_id,
                attempts = message.dequeue_count,
                "retry budget exhausted, quarantining"
            );
            let record = DeadLetterRecord::new(
                &message.payload,
                message.dequeue_count,
                format!("retry budget exhausted after {} deliveries", message.dequeue_count),
            );
            if let Err(e) = self.queue.dead_letter(record).await {
                error!(worker = self.handler.name(), error = %e, "dead-letter write failed");
                return Some(self.backoff_delay(message.dequeue_count));
            }
            self.ack(message).await;
            return None;
        }

        match self.handler.handle(&message.payload).await {
            Ok(()) => {
                self.ack(message).await;
                None
            }
            Err(LookoutError::Malformed(reason)) => {
                warn!(
                    worker = self.handler.name(),
                    message_id = %message.message_id,
                    %reason,
                    "malformed message dropped"
                );
                self.ack(message).await;
                None
            }
            Err(LookoutError::Unroutable(reason)) => {
                warn!(
                    worker = self.handler.name(),
                    message_id = %message.message_id,
                    %reason,
                    "unroutable message dead-lettered"
                );
                let record =
                    DeadLetterRecord::new(&message.payload, message.dequeue_count, reason);
                if let Err(e) = self.queue.dead_letter(record).await {
                    error!(worker = self.handler.name(), error = %e, "dead-letter write failed");
                    return Some(self.backoff_delay(message.dequeue_count));
                }
                self.ack(message).await;
                None
            }
            Err(e) => {
                warn!(
                    worker = self.handler.name(),
                    message_id = %message.message_id,
                    attempt = message.dequeue_count,
                    error = %e,
                    "handling failed, leaving for redelivery"
                );
                Some(self.backoff_delay(message.dequeue_count))
            }
        }
    }

    async fn ack(&self, message: &QueueMessage) {
        if let Err(e) = self.queue.delete(message).await {
            // The message will be redelivered; safe under at-least-once
            warn!(
                worker = self.handler.name(),
                message_id = %message.message_id,
                error = %e,
                "delete failed"
            );
        } else {
            debug!(
                worker = self.handler.name(),
                message_id = %message.message_id,
                "message settled"
            );
        }
    }

    fn backoff_delay(&self, attempts: u32) -> Duration {
        let secs = 2u64.saturating_pow(attempts.min(32));
        Duration::from_secs(secs).min(self.config.max_backoff)
    }
}
