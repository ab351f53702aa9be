use thiserror::Error;

#[derive(Error, Debug)]
pub enum LookoutError {
    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("malformed message: {0}")]
    Malformed(String),

    #[error("unroutable message: {0}")]
    Unroutable(String),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("lock error: {0}")]
    Lock(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, LookoutError>;

// Failure taxonomy used by the queue workers:
//
// - `Malformed` - the payload cannot be decoded. Never retried; the message
//   is deleted outright.
// - `Unroutable` - the payload decoded but names an unknown event kind or
//   detector. Dead-lettered immediately; this is not a transient fault.
// - every other variant - transient. The message is left on the queue for
//   natural redelivery with exponential backoff.
