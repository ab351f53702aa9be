//! Cron-driven scheduling for lookout detectors
//!
//! Hosts register their detectors (usually straight from a
//! `lookout::DetectorRegistry`) and run a [`DetectorScheduler`] alongside
//! the pipeline's queue workers. Scheduling is per-detector cron with
//! optional run-on-startup, non-overlapping runs, and a development-only
//! global cron override.

pub mod config;
pub mod error;
pub mod schedule;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use error::{Result, SchedulerError};
pub use schedule::{next_occurrence, parse_cron};
pub use scheduler::DetectorScheduler;
