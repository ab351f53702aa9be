use crate::error::Result;
use async_trait::async_trait;

/// A single partition/row-keyed record
#[derive(Debug, Clone, PartialEq)]
pub struct TableRow {
    pub partition: String,
    pub row: String,
    pub body: String,
}

/// Partition/row-keyed store
///
/// Rows within a partition are ordered by row key; range queries return
/// ascending row-key order. The event stream exploits this by writing
/// inverted-timestamp row keys so an ascending scan is newest-first.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Insert or overwrite a row
    async fn upsert(&self, table: &str, row: TableRow) -> Result<()>;

    /// Point lookup
    async fn get(&self, table: &str, partition: &str, row: &str) -> Result<Option<TableRow>>;

    /// Scan a partition in ascending row-key order, up to `take` rows
    async fn query_partition(
        &self,
        table: &str,
        partition: &str,
        take: Option<usize>,
    ) -> Result<Vec<TableRow>>;
}
