//! Per (detector, scope) persisted cursor/state

use chrono::{DateTime, Utc};
use lookout_core::error::{LookoutError, Result};
use lookout_core::traits::{TableRow, TableStore};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default table backing detector state
pub const DETECTOR_STATE_TABLE: &str = "detectorstate";

/// Stored state for one (detector, scope) pair
///
/// Created on first run for a scope, overwritten after every successful
/// scope evaluation, never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorState<T> {
    pub updated_utc: DateTime<Utc>,
    pub state: T,
}

pub struct DetectorStateStore {
    store: Arc<dyn TableStore>,
    table: String,
}

impl DetectorStateStore {
    pub fn new(store: Arc<dyn TableStore>) -> Self {
        Self::with_table(store, DETECTOR_STATE_TABLE)
    }

    pub fn with_table(store: Arc<dyn TableStore>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    pub async fn load<T: DeserializeOwned>(
        &self,
        detector: &str,
        scope_key: &str,
    ) -> Result<Option<DetectorState<T>>> {
        let Some(row) = self.store.get(&self.table, detector, scope_key).await? else {
            return Ok(None);
        };
        let state = serde_json::from_str(&row.body).map_err(|e| {
            LookoutError::Storage(format!(
                "corrupt detector state '{}/{}': {}",
                detector, scope_key, e
            ))
        })?;
        Ok(Some(state))
    }

    /// Overwrite the stored state, stamping a fresh `updated_utc`
    pub async fn save<T: Serialize>(
        &self,
        detector: &str,
        scope_key: &str,
        state: &T,
    ) -> Result<()> {
        let body = serde_json::to_string(&DetectorState {
            updated_utc: Utc::now(),
            state,
        })
        .map_err(|e| LookoutError::Serialization(e.to_string()))?;
        self.store
            .upsert(
                &self.table,
                TableRow {
                    partition: detector.to_string(),
                    row: scope_key.to_string(),
                    body,
                },
            )
            .await
    }
}
