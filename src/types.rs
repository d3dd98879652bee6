//! Common types used throughout Pagewise
//!
//! This module contains the record model served by every strategy and the
//! strict timestamp format used on the wire.

use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Type Aliases
// ============================================================================

/// Timestamp type for record creation times
pub type Timestamp = DateTime<Utc>;

// ============================================================================
// Record
// ============================================================================

/// A product row from the record store
///
/// `id` is assigned monotonically and is unique, so `(created_at, id)` is a
/// strict total order even when several records share a timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Unique, monotonically assigned identifier
    pub id: u64,
    /// Product name
    pub name: String,
    /// Product price
    pub price: f64,
    /// Creation time
    pub created_at: Timestamp,
}

impl Record {
    /// Create a new record
    pub fn new(id: u64, name: impl Into<String>, price: f64, created_at: Timestamp) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            created_at,
        }
    }

    /// Composite keyset ordering key
    pub fn seek_key(&self) -> (Timestamp, u64) {
        (self.created_at, self.id)
    }
}

// ============================================================================
// Timestamps
// ============================================================================

/// Parse a strict RFC 3339 timestamp, normalised to UTC
///
/// Anything that isn't RFC 3339 is rejected; a bound that can't be parsed is
/// never treated as "no bound".
pub fn parse_timestamp(field: &str, value: &str) -> Result<Timestamp> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            Error::invalid_argument(field, format!("'{value}' is not an RFC 3339 timestamp: {e}"))
        })
}

/// Format a timestamp as RFC 3339 without losing sub-second precision
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}
