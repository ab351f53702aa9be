//! Abstract collaborator contracts
//!
//! The pipeline core is written against these traits; transports (queue
//! service, table service, lock service) plug in behind them.

mod lock;
mod queue;
mod table;

pub use lock::{LockManager, LockOptions};
pub use queue::{Queue, QueueProvider};
pub use table::{TableRow, TableStore};
