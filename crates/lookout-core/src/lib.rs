//! Core contracts for the lookout event/detection pipeline
//!
//! This crate defines the shared vocabulary the pipeline is written
//! against: the domain event and envelope types, the abstract collaborator
//! traits (queue, table store, lock manager), the explicit event-kind
//! registry, the queue-name transform, and the shutdown signal.
//!
//! Transports live elsewhere; `lookout-memory` provides the in-process
//! reference implementations used in tests.

pub mod error;
pub mod queue_name;
pub mod registry;
pub mod shutdown;
pub mod traits;
pub mod types;

pub use error::{LookoutError, Result};
pub use registry::{EventTypeRegistry, RegisteredKind};
pub use shutdown::Shutdown;
pub use traits::{LockManager, LockOptions, Queue, QueueProvider, TableRow, TableStore};
pub use types::{DeadLetterRecord, DomainEvent, Envelope, EventId, LockLease, QueueMessage, ScopeId};
