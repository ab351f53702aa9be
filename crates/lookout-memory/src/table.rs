//! In-memory partition/row-keyed table store

use async_trait::async_trait;
use lookout_core::error::Result;
use lookout_core::traits::{TableRow, TableStore};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};

/// In-process [`TableStore`] implementation
///
/// Rows are kept in a `BTreeMap` keyed by (partition, row) so partition
/// scans come back in ascending row-key order, matching the contract the
/// event stream's inverted row keys depend on.
#[derive(Default)]
pub struct MemoryTableStore {
    tables: Mutex<HashMap<String, BTreeMap<(String, String), String>>>,
}

impl MemoryTableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total row count for a table (test inspection)
    pub fn row_count(&self, table: &str) -> usize {
        self.tables
            .lock()
            .get(table)
            .map(|rows| rows.len())
            .unwrap_or(0)
    }
}

#[async_trait]
impl TableStore for MemoryTableStore {
    async fn upsert(&self, table: &str, row: TableRow) -> Result<()> {
        self.tables
            .lock()
            .entry(table.to_string())
            .or_default()
            .insert((row.partition, row.row), row.body);
        Ok(())
    }

    async fn get(&self, table: &str, partition: &str, row: &str) -> Result<Option<TableRow>> {
        let tables = self.tables.lock();
        let body = tables
            .get(table)
            .and_then(|rows| rows.get(&(partition.to_string(), row.to_string())));
        Ok(body.map(|body| TableRow {
            partition: partition.to_string(),
            row: row.to_string(),
            body: body.clone(),
        }))
    }

    async fn query_partition(
        &self,
        table: &str,
        partition: &str,
        take: Option<usize>,
    ) -> Result<Vec<TableRow>> {
        let tables = self.tables.lock();
        let Some(rows) = tables.get(table) else {
            return Ok(Vec::new());
        };

        let start = (partition.to_string(), String::new());
        let mut out = Vec::new();
        for ((part, row), body) in rows.range(start..) {
            if part != partition {
                break;
            }
            if take.is_some_and(|t| out.len() >= t) {
                break;
            }
            out.push(TableRow {
                partition: part.clone(),
                row: row.clone(),
                body: body.clone(),
            });
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(partition: &str, row_key: &str, body: &str) -> TableRow {
        TableRow {
            partition: partition.to_string(),
            row: row_key.to_string(),
            body: body.to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_overwrites() {
        let store = MemoryTableStore::new();
        store.upsert("t", row("p", "r", "one")).await.unwrap();
        store.upsert("t", row("p", "r", "two")).await.unwrap();

        let got = store.get("t", "p", "r").await.unwrap().unwrap();
        assert_eq!(got.body, "two");
        assert_eq!(store.row_count("t"), 1);
    }

    #[tokio::test]
    async fn partition_scan_is_row_key_ordered() {
        let store = MemoryTableStore::new();
        store.upsert("t", row("p", "b", "2")).await.unwrap();
        store.upsert("t", row("p", "a", "1")).await.unwrap();
        store.upsert("t", row("p", "c", "3")).await.unwrap();
        store.upsert("t", row("q", "a", "x")).await.unwrap();

        let rows = store.query_partition("t", "p", None).await.unwrap();
        let keys: Vec<_> = rows.iter().map(|r| r.row.as_str()).collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        let limited = store.query_partition("t", "p", Some(2)).await.unwrap();
        assert_eq!(limited.len(), 2);
    }

    #[tokio::test]
    async fn missing_table_and_partition_are_empty() {
        let store = MemoryTableStore::new();
        assert!(store.get("t", "p", "r").await.unwrap().is_none());
        assert!(store.query_partition("t", "p", None).await.unwrap().is_empty());
    }
}
