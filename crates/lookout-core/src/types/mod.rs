mod event;
mod lock;
mod message;

pub use event::{DomainEvent, Envelope, EventId, ScopeId};
pub use lock::LockLease;
pub use message::{DeadLetterRecord, QueueMessage};
