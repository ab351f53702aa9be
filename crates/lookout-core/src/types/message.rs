use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message received from a queue
///
/// `message_id` and `pop_receipt` together form the ack token; `delete`
/// requires the receipt from the most recent receive. `dequeue_count` is
/// the number of times the message has been delivered, including this one.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueMessage {
    pub message_id: String,
    pub pop_receipt: String,
    pub dequeue_count: u32,
    pub payload: String,
}

/// Durable quarantine record for a message that exhausted its retry budget
/// or was rejected as unroutable. Append-only, outside the live queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterRecord {
    pub payload: String,
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
    pub last_error: String,
}

impl DeadLetterRecord {
    pub fn new(payload: impl Into<String>, attempts: u32, last_error: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            attempts,
            failed_at: Utc::now(),
            last_error: last_error.into(),
        }
    }
}
