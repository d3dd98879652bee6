//! DuckDB-backed record store
//!
//! Range queries are rendered as parameterised SQL against a single table
//! with columns `id`, `name`, `price` and `created_at` (TIMESTAMP).
//! DuckDB calls block, so they run on the blocking thread pool. Each call
//! gets its own connection to the shared database so requests run side by
//! side, and a call abandoned by its caller interrupts its query.

use super::store::RecordStore;
use crate::config::validate_identifier;
use crate::error::{Error, Result};
use crate::pagination::{LowerBound, OrderKey, RangeQuery};
use crate::types::{Record, Timestamp};
use async_trait::async_trait;
use chrono::DateTime;
use duckdb::types::Value;
use duckdb::{Connection, InterruptHandle};
use std::sync::{Arc, Mutex};

/// Record store reading from a DuckDB table
pub struct DuckDbStore {
    /// Connection the per-call connections are cloned from
    conn: Arc<Mutex<Connection>>,
    /// Table holding the records
    table: String,
    /// Database path (for logging)
    path: String,
}

impl std::fmt::Debug for DuckDbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbStore")
            .field("table", &self.table)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Raw row as read from DuckDB, before range checks
type RawRow = (i64, String, f64, i64);

impl DuckDbStore {
    /// Open a DuckDB database file (or `:memory:`) read from `table`
    pub fn open(path: &str, table: impl Into<String>) -> Result<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| Error::config(format!("Failed to open DuckDB database '{path}': {e}")))?;

        Self::with_path(conn, table.into(), path.to_string())
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection, table: impl Into<String>) -> Result<Self> {
        Self::with_path(conn, table.into(), "<connection>".to_string())
    }

    fn with_path(conn: Connection, table: String, path: String) -> Result<Self> {
        validate_identifier(&table)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            table,
            path,
        })
    }

    /// Table being paginated
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Human-readable location, for logging
    pub fn connection_info(&self) -> String {
        format!("duckdb:{}#{}", self.path, self.table)
    }

    /// Render a range query as SQL plus bound parameters
    fn build_scan_sql(&self, query: &RangeQuery) -> (String, Vec<Value>) {
        let mut sql = format!(
            "SELECT CAST(id AS BIGINT), name, CAST(price AS DOUBLE), epoch_us(created_at) FROM {}",
            self.table
        );
        let mut params = Vec::new();

        match query.lower_bound {
            Some(LowerBound::Id(last_id)) => {
                sql.push_str(" WHERE id > ?");
                params.push(Value::BigInt(id_param(last_id)));
            }
            Some(LowerBound::CreatedAtId {
                last_created_at,
                last_id,
            }) => {
                // (created_at, id) > (?, ?) expanded for the planner
                sql.push_str(
                    " WHERE (created_at > make_timestamp(?) \
                     OR (created_at = make_timestamp(?) AND id > ?))",
                );
                let micros = last_created_at.timestamp_micros();
                params.push(Value::BigInt(micros));
                params.push(Value::BigInt(micros));
                params.push(Value::BigInt(id_param(last_id)));
            }
            None => {}
        }

        match query.order {
            OrderKey::Id => sql.push_str(" ORDER BY id ASC"),
            OrderKey::CreatedAtId => sql.push_str(" ORDER BY created_at ASC, id ASC"),
        }

        sql.push_str(&format!(
            " LIMIT {} OFFSET {}",
            query.fetch.min(i64::MAX as u64),
            query.offset.min(i64::MAX as u64)
        ));

        (sql, params)
    }

    /// Open a fresh connection to the same database
    fn connect(&self) -> Result<Connection> {
        self.conn
            .lock()
            .map_err(|_| Error::store("DuckDB connection lock poisoned"))?
            .try_clone()
            .map_err(|e| Error::store(format!("Failed to open DuckDB connection: {e}")))
    }

    /// Run a closure against its own connection on the blocking pool
    ///
    /// Dropping the returned future before it completes interrupts the
    /// query, so a cancelled request doesn't keep DuckDB busy.
    async fn with_connection<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connect()?;
        let mut interrupt = InterruptOnDrop(Some(conn.interrupt_handle()));

        let result = tokio::task::spawn_blocking(move || f(&conn))
            .await
            .map_err(|e| Error::store(format!("DuckDB task failed: {e}")));

        interrupt.disarm();
        result?
    }
}

#[async_trait]
impl RecordStore for DuckDbStore {
    async fn scan(&self, query: &RangeQuery) -> Result<Vec<Record>> {
        let (sql, params) = self.build_scan_sql(query);

        tracing::debug!("Executing query: {}", sql);

        let rows: Vec<RawRow> = self
            .with_connection(move |conn| {
                let mut stmt = conn
                    .prepare(&sql)
                    .map_err(|e| Error::store(format!("Failed to prepare range scan: {e}")))?;

                let rows = stmt
                    .query_map(duckdb::params_from_iter(params.iter()), |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })
                    .map_err(|e| Error::store(format!("Range scan failed: {e}")))?
                    .collect::<std::result::Result<Vec<RawRow>, _>>()
                    .map_err(|e| Error::store(format!("Failed to read row: {e}")))?;

                Ok(rows)
            })
            .await?;

        rows.into_iter().map(row_to_record).collect()
    }

    async fn count(&self) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.table);

        tracing::debug!("Executing query: {}", sql);

        let count: i64 = self
            .with_connection(move |conn| {
                conn.query_row(&sql, [], |row| row.get(0))
                    .map_err(|e| Error::store(format!("Count query failed: {e}")))
            })
            .await?;

        u64::try_from(count).map_err(|_| Error::store(format!("negative row count {count}")))
    }
}

/// Interrupts the running query unless disarmed first
struct InterruptOnDrop(Option<Arc<InterruptHandle>>);

impl InterruptOnDrop {
    fn disarm(&mut self) {
        self.0 = None;
    }
}

impl Drop for InterruptOnDrop {
    fn drop(&mut self) {
        if let Some(handle) = self.0.take() {
            tracing::debug!("Interrupting abandoned DuckDB query");
            handle.interrupt();
        }
    }
}

/// Ids above `i64::MAX` can't exist in a BIGINT column, so clamping keeps
/// `id > ?` correct
fn id_param(id: u64) -> i64 {
    i64::try_from(id).unwrap_or(i64::MAX)
}

fn micros_to_timestamp(micros: i64) -> Result<Timestamp> {
    DateTime::from_timestamp_micros(micros)
        .ok_or_else(|| Error::store(format!("created_at {micros}us is out of range")))
}

fn row_to_record((id, name, price, created_at): RawRow) -> Result<Record> {
    let id = u64::try_from(id).map_err(|_| Error::store(format!("negative record id {id}")))?;
    Ok(Record::new(id, name, price, micros_to_timestamp(created_at)?))
}
