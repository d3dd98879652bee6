//! In-process record store
//!
//! Evaluates range queries directly over a vector of records. Used for the
//! sample-data server mode and throughout the tests.

use super::store::RecordStore;
use crate::error::{Error, Result};
use crate::pagination::RangeQuery;
use crate::types::{Record, Timestamp};
use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Records sharing a timestamp in the sample data set
const SAMPLE_TIES: u64 = 3;

/// In-memory record store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<Vec<Record>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding the given records
    pub fn from_records(mut records: Vec<Record>) -> Result<Self> {
        records.sort_by_key(|r| r.id);
        if let Some(pair) = records.windows(2).find(|w| w[0].id == w[1].id) {
            return Err(Error::store(format!("duplicate record id {}", pair[0].id)));
        }
        Ok(Self {
            records: Arc::new(RwLock::new(records)),
        })
    }

    /// Create a store with `count` sample products
    ///
    /// Ids run from 1 to `count`; every three consecutive products share a
    /// creation time so keyset ordering has ties to break.
    pub fn with_sample_products(count: u64) -> Self {
        let records = (1..=count).map(sample_product).collect();
        Self {
            records: Arc::new(RwLock::new(records)),
        }
    }

    /// Add a record, simulating a concurrent writer
    pub async fn insert(&self, record: Record) -> Result<()> {
        let mut records = self.records.write().await;
        match records.binary_search_by_key(&record.id, |r| r.id) {
            Ok(_) => Err(Error::store(format!("duplicate record id {}", record.id))),
            Err(pos) => {
                records.insert(pos, record);
                Ok(())
            }
        }
    }

    /// Remove a record by id
    pub async fn remove(&self, id: u64) -> Option<Record> {
        let mut records = self.records.write().await;
        let pos = records.binary_search_by_key(&id, |r| r.id).ok()?;
        Some(records.remove(pos))
    }

    /// Number of records currently held
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn scan(&self, query: &RangeQuery) -> Result<Vec<Record>> {
        let records = self.records.read().await;

        let mut matching: Vec<&Record> = records.iter().filter(|r| query.admits(r)).collect();
        matching.sort_by(|a, b| query.order.compare(a, b));

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let fetch = usize::try_from(query.fetch).unwrap_or(usize::MAX);

        Ok(matching
            .into_iter()
            .skip(offset)
            .take(fetch)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.read().await.len() as u64)
    }
}

fn sample_epoch() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn sample_product(id: u64) -> Record {
    let offset = Duration::seconds(((id - 1) / SAMPLE_TIES) as i64);
    Record::new(
        id,
        format!("Product {id}"),
        ((id * 137) % 10_000) as f64 / 100.0,
        sample_epoch() + offset,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::{LowerBound, OrderKey};

    fn query(order: OrderKey, lower_bound: Option<LowerBound>, offset: u64, fetch: u64) -> RangeQuery {
        RangeQuery {
            order,
            lower_bound,
            offset,
            fetch,
        }
    }

    fn ids(records: &[Record]) -> Vec<u64> {
        records.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_sample_products_share_timestamps() {
        let store = MemoryStore::with_sample_products(7);
        assert_eq!(store.count().await.unwrap(), 7);

        let all = store
            .scan(&query(OrderKey::Id, None, 0, 100))
            .await
            .unwrap();
        assert_eq!(all[0].created_at, all[2].created_at);
        assert!(all[3].created_at > all[2].created_at);
    }

    #[tokio::test]
    async fn test_scan_offset_and_fetch() {
        let store = MemoryStore::with_sample_products(25);
        let page = store
            .scan(&query(OrderKey::Id, None, 20, 10))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![21, 22, 23, 24, 25]);
    }

    #[tokio::test]
    async fn test_scan_orders_by_created_at_then_id() {
        let t0 = sample_epoch();
        let t1 = t0 + Duration::seconds(1);
        let store = MemoryStore::from_records(vec![
            Record::new(1, "a", 1.0, t1),
            Record::new(2, "b", 1.0, t0),
            Record::new(3, "c", 1.0, t1),
            Record::new(4, "d", 1.0, t0),
        ])
        .unwrap();

        let page = store
            .scan(&query(OrderKey::CreatedAtId, None, 0, 10))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![2, 4, 1, 3]);

        let bound = LowerBound::CreatedAtId {
            last_created_at: t0,
            last_id: 4,
        };
        let page = store
            .scan(&query(OrderKey::CreatedAtId, Some(bound), 0, 10))
            .await
            .unwrap();
        assert_eq!(ids(&page), vec![1, 3]);
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let store = MemoryStore::with_sample_products(3);
        let record = Record::new(10, "late", 1.0, sample_epoch());
        store.insert(record.clone()).await.unwrap();
        assert!(store.insert(record).await.is_err());
        assert_eq!(store.len().await, 4);

        assert_eq!(store.remove(2).await.map(|r| r.id), Some(2));
        assert!(store.remove(2).await.is_none());
        assert_eq!(store.len().await, 3);
    }

    #[test]
    fn test_from_records_rejects_duplicates() {
        let t = sample_epoch();
        let result = MemoryStore::from_records(vec![
            Record::new(1, "a", 1.0, t),
            Record::new(1, "b", 1.0, t),
        ]);
        assert!(result.is_err());
    }
}
