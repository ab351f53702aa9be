//! Append-only per-scope event log
//!
//! Envelopes are stored keyed by (scope, inverted-timestamp ⧺ event id) so
//! an ascending row-key scan returns the newest events first. Rows are
//! created once and never updated or deleted.

use lookout_core::error::{LookoutError, Result};
use lookout_core::traits::{TableRow, TableStore};
use lookout_core::types::{DomainEvent, Envelope, EventId};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Default table backing the event stream
pub const EVENTS_TABLE: &str = "events";

/// Row key that sorts newest-first under ascending row-key order
///
/// Pre-epoch timestamps all invert to the same maximal prefix: they sort
/// last as a group, tie-broken by event id.
pub fn stream_row_key(occurred_at: DateTime<Utc>, event_id: EventId) -> String {
    let micros = occurred_at.timestamp_micros();
    let inverted = i64::MAX.saturating_sub(micros) as u64;
    format!("{:020}-{}", inverted, event_id)
}

/// Durable event stream over a [`TableStore`]
pub struct EventStore {
    store: Arc<dyn TableStore>,
    table: String,
}

impl EventStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self::with_table(store, EVENTS_TABLE)
    }

    pub fn with_table(store: Arc<dyn TableStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Append an envelope to its scope's stream; the only mutator
    pub async fn append(&self, envelope: &Envelope) -> Result<()> {
        let row = TableRow {
            partition: envelope.scope_id.clone(),
            row: stream_row_key(envelope.occurred_at, envelope.event_id),
            body: envelope.to_json()?,
        };
        self.store.upsert(&self.table, row).await
    }

    /// Has this kind ever fired for this scope?
    ///
    /// The idempotency primitive detectors use before re-emitting.
    pub async fn exists(&self, kind: &str, scope_id: &str) -> Result<bool> {
        let rows = self.store.query_partition(&self.table, scope_id, None).await?;
        for row in rows {
            if Self::decode(&row)?.kind == kind {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Typed form of [`EventStore::exists`]
    pub async fn exists_for<E: DomainEvent>(&self, scope_id: &str) -> Result<bool> {
        self.exists(E::KIND, scope_id).await
    }

    /// The newest-first envelope stream for a scope
    pub async fn stream(&self, scope_id: &str, take: Option<usize>) -> Result<Vec<Envelope>> {
        let rows = self.store.query_partition(&self.table, scope_id, take).await?;
        rows.iter().map(Self::decode).collect()
    }

    fn decode(row: &TableRow) -> Result<Envelope> {
        serde_json::from_str(&row.body).map_err(|e| {
            LookoutError::Storage(format!(
                "corrupt event row '{}/{}': {}",
                row.partition, row.row, e
            ))
        })
    }
}
