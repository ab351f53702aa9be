//! Lookout: durable event/detection pipeline
//!
//! An at-least-once publish/dispatch/subscribe system plus a detector
//! framework that scans domain state for newly-true conditions and emits
//! events, coordinated across running instances with distributed locks and
//! per-scope persisted state.
//!
//! The moving parts:
//!
//! - [`EventStore`] / [`EventPublisher`] - append-only per-scope event log;
//!   persist-then-enqueue publication
//! - [`EventDispatcher`] - consumes the main queue and fans envelopes out
//!   to every interested subscriber queue
//! - [`CatalogueBuilder`] / [`Subscriber`] - explicit startup-time
//!   subscription map; one isolated queue worker per subscriber
//! - [`QueueWorker`] / [`QueueHandler`] - the generic retry/dead-letter
//!   poll loop everything above is built on
//! - [`Detect`] / [`DetectorRunner`] - locked, stateful per-scope condition
//!   evaluation with bounded concurrency
//! - [`DetectorRegistry`] / [`TriggerHandler`] - ad-hoc single-scope runs
//!   requested over the trigger queue
//!
//! Scheduling of detectors lives in the `lookout-scheduler` crate; the
//! abstract queue/table/lock contracts live in `lookout-core`, with
//! in-memory reference implementations in `lookout-memory`.

pub mod catalogue;
pub mod detector;
pub mod dispatcher;
pub mod event_store;
pub mod events;
pub mod publisher;
pub mod state_store;
pub mod subscriber;
pub mod trigger;
pub mod worker;

pub use catalogue::{CatalogueBuilder, SubscriberCatalogue, SubscriberEndpoint};
pub use detector::{
    Detect, Detector, DetectorRunner, DetectorSchedule, EventSink, DEFAULT_MAX_CONCURRENCY,
};
pub use dispatcher::{DispatchHandler, EventDispatcher};
pub use event_store::{stream_row_key, EventStore, EVENTS_TABLE};
pub use events::{JuniorProgressChanged, MembershipCategoryChanged};
pub use publisher::{EventPublisher, DISPATCH_QUEUE};
pub use state_store::{DetectorState, DetectorStateStore, DETECTOR_STATE_TABLE};
pub use subscriber::Subscriber;
pub use trigger::{DetectorRegistry, TriggerHandler, TriggerMessage, TRIGGER_QUEUE};
pub use worker::{PollOutcome, QueueHandler, QueueWorker, WorkerConfig};

pub use lookout_core::{
    DomainEvent, Envelope, EventId, EventTypeRegistry, LookoutError, Result, ScopeId, Shutdown,
};
