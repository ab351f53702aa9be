//! In-memory queue with visibility timeouts and a dead-letter sink

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use lookout_core::error::{LookoutError, Result};
use lookout_core::traits::{Queue, QueueProvider};
use lookout_core::types::{DeadLetterRecord, QueueMessage};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_VISIBILITY: Duration = Duration::from_secs(30);

struct StoredMessage {
    message_id: String,
    pop_receipt: String,
    payload: String,
    dequeue_count: u32,
    visible_at: DateTime<Utc>,
}

#[derive(Default)]
struct QueueState {
    messages: Vec<StoredMessage>,
    dead_letters: Vec<DeadLetterRecord>,
    next_id: u64,
}

/// In-process [`Queue`] implementation
///
/// Faithful to the transport contract the workers are written against:
/// receive hides a message for the visibility timeout and bumps its
/// dequeue count; delete requires the receipt from the latest receive.
pub struct MemoryQueue {
    name: String,
    state: Mutex<QueueState>,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(QueueState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of live messages (visible or not)
    pub fn len(&self) -> usize {
        self.state.lock().messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the dead-letter sink
    pub fn dead_letters(&self) -> Vec<DeadLetterRecord> {
        self.state.lock().dead_letters.clone()
    }
}

#[async_trait]
impl Queue for MemoryQueue {
    async fn enqueue(&self, payload: &str) -> Result<()> {
        let mut state = self.state.lock();
        state.next_id += 1;
        let message_id = format!("{}-{}", self.name, state.next_id);
        state.messages.push(StoredMessage {
            message_id,
            pop_receipt: String::new(),
            payload: payload.to_string(),
            dequeue_count: 0,
            visible_at: Utc::now(),
        });
        Ok(())
    }

    async fn receive(
        &self,
        max: usize,
        visibility: Option<Duration>,
    ) -> Result<Vec<QueueMessage>> {
        let visibility = visibility.unwrap_or(DEFAULT_VISIBILITY);
        let hide_for = ChronoDuration::from_std(visibility)
            .map_err(|e| LookoutError::Queue(format!("visibility timeout: {}", e)))?;
        let now = Utc::now();

        let mut state = self.state.lock();
        let mut received = Vec::new();
        for message in state.messages.iter_mut() {
            if received.len() >= max {
                break;
            }
            if message.visible_at > now {
                continue;
            }
            message.dequeue_count += 1;
            message.visible_at = now + hide_for;
            message.pop_receipt = format!("{}:{}", message.message_id, message.dequeue_count);
            received.push(QueueMessage {
                message_id: message.message_id.clone(),
                pop_receipt: message.pop_receipt.clone(),
                dequeue_count: message.dequeue_count,
                payload: message.payload.clone(),
            });
        }
        Ok(received)
    }

    async fn delete(&self, message: &QueueMessage) -> Result<()> {
        let mut state = self.state.lock();
        let Some(index) = state
            .messages
            .iter()
            .position(|m| m.message_id == message.message_id)
        else {
            // Already gone; deleting twice is harmless under at-least-once
            return Ok(());
        };
        if state.messages[index].pop_receipt != message.pop_receipt {
            return Err(LookoutError::Queue(format!(
                "stale pop receipt for message '{}'",
                message.message_id
            )));
        }
        state.messages.remove(index);
        Ok(())
    }

    async fn dead_letter(&self, record: DeadLetterRecord) -> Result<()> {
        self.state.lock().dead_letters.push(record);
        Ok(())
    }
}

/// Named registry of [`MemoryQueue`]s, provisioned on first use
#[derive(Default)]
pub struct MemoryQueueProvider {
    queues: DashMap<String, Arc<MemoryQueue>>,
}

impl MemoryQueueProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an existing queue without creating it
    pub fn get(&self, name: &str) -> Option<Arc<MemoryQueue>> {
        self.queues.get(name).map(|q| q.clone())
    }

    pub fn names(&self) -> Vec<String> {
        self.queues.iter().map(|q| q.key().clone()).collect()
    }
}

#[async_trait]
impl QueueProvider for MemoryQueueProvider {
    async fn queue(&self, name: &str) -> Result<Arc<dyn Queue>> {
        let queue = self
            .queues
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryQueue::new(name)))
            .clone();
        Ok(queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn receive_hides_and_redelivers() {
        let queue = MemoryQueue::new("test");
        queue.enqueue("a").await.unwrap();

        let first = queue.receive(10, Some(Duration::from_secs(60))).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].dequeue_count, 1);

        // Hidden until the visibility timeout elapses
        let hidden = queue.receive(10, None).await.unwrap();
        assert!(hidden.is_empty());
    }

    #[tokio::test]
    async fn zero_visibility_increments_dequeue_count() {
        let queue = MemoryQueue::new("test");
        queue.enqueue("a").await.unwrap();

        for expected in 1..=3 {
            let batch = queue.receive(1, Some(Duration::ZERO)).await.unwrap();
            assert_eq!(batch[0].dequeue_count, expected);
        }
    }

    #[tokio::test]
    async fn delete_requires_latest_receipt() {
        let queue = MemoryQueue::new("test");
        queue.enqueue("a").await.unwrap();

        let first = queue.receive(1, Some(Duration::ZERO)).await.unwrap();
        let second = queue.receive(1, Some(Duration::ZERO)).await.unwrap();

        let err = queue.delete(&first[0]).await.unwrap_err();
        assert!(matches!(err, LookoutError::Queue(_)));

        queue.delete(&second[0]).await.unwrap();
        assert!(queue.is_empty());

        // Deleting an already-deleted message is a no-op
        queue.delete(&second[0]).await.unwrap();
    }

    #[tokio::test]
    async fn dead_letter_sink_is_append_only() {
        let queue = MemoryQueue::new("test");
        queue
            .dead_letter(DeadLetterRecord::new("bad", 6, "boom"))
            .await
            .unwrap();

        let records = queue.dead_letters();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].attempts, 6);
        assert_eq!(records[0].last_error, "boom");
    }

    #[tokio::test]
    async fn provider_returns_same_queue_per_name() {
        let provider = MemoryQueueProvider::new();
        let a = provider.queue("alpha").await.unwrap();
        a.enqueue("x").await.unwrap();

        let again = provider.queue("alpha").await.unwrap();
        let batch = again.receive(1, Some(Duration::ZERO)).await.unwrap();
        assert_eq!(batch[0].payload, "x");
    }
}
