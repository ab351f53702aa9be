//! In-memory backends for the lookout pipeline
//!
//! Reference implementations of the collaborator contracts from
//! `lookout-core`: a queue with visibility timeouts, dequeue counts and a
//! dead-letter sink; a partition/row-keyed table store; and a named lock
//! manager with expiry and fencing. Production deployments substitute real
//! transports behind the same traits; these back the tests and local runs.

mod lock;
mod queue;
mod table;

pub use lock::MemoryLockManager;
pub use queue::{MemoryQueue, MemoryQueueProvider};
pub use table::MemoryTableStore;
