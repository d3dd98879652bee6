//! Record store capability

use crate::error::Result;
use crate::pagination::RangeQuery;
use crate::types::Record;
use async_trait::async_trait;
use std::sync::Arc;

/// Read-only access to the ordered record collection
///
/// Implementations own their connection lifecycle; the pagination engine
/// receives a handle per call and never retries failed calls.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Execute a range scan: filter by the lower bound, order, skip, fetch
    async fn scan(&self, query: &RangeQuery) -> Result<Vec<Record>>;

    /// Count every record in the collection, ignoring any bound
    async fn count(&self) -> Result<u64>;

    /// Verify the store is reachable
    async fn check(&self) -> Result<()> {
        self.count().await.map(|_| ())
    }
}

/// Shared store handle passed to request handlers
pub type SharedStore = Arc<dyn RecordStore>;
