//! Range query construction
//!
//! Translates a position descriptor into the bounded scan a record store
//! executes: ordering key, optional lower bound, rows to skip, rows to fetch.

use super::types::PositionDescriptor;
use crate::error::Result;
use crate::types::{Record, Timestamp};
use std::cmp::Ordering;

/// Ordering key of a range scan, always ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderKey {
    /// `ORDER BY id`
    Id,
    /// `ORDER BY created_at, id`
    CreatedAtId,
}

impl OrderKey {
    /// Compare two records under this ordering
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        match self {
            Self::Id => a.id.cmp(&b.id),
            Self::CreatedAtId => a.seek_key().cmp(&b.seek_key()),
        }
    }
}

/// Strict lower bound pushed down to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LowerBound {
    /// `id > last_id`
    Id(u64),
    /// `(created_at, id) > (last_created_at, last_id)`, compared lexicographically
    CreatedAtId {
        last_created_at: Timestamp,
        last_id: u64,
    },
}

impl LowerBound {
    /// Whether a record lies strictly after the bound
    pub fn admits(&self, record: &Record) -> bool {
        match self {
            Self::Id(last_id) => record.id > *last_id,
            Self::CreatedAtId {
                last_created_at,
                last_id,
            } => record.seek_key() > (*last_created_at, *last_id),
        }
    }
}

/// A bounded, ordered scan over the record collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeQuery {
    pub order: OrderKey,
    pub lower_bound: Option<LowerBound>,
    /// Rows to skip after filtering and ordering
    pub offset: u64,
    /// Maximum rows to return
    pub fetch: u64,
}

impl RangeQuery {
    /// Whether a record passes the lower-bound predicate
    pub fn admits(&self, record: &Record) -> bool {
        self.lower_bound.map_or(true, |bound| bound.admits(record))
    }
}

/// Builds store queries from position descriptors
#[derive(Debug, Clone, Copy, Default)]
pub struct RangeQueryBuilder;

impl RangeQueryBuilder {
    /// Build the range query for a descriptor
    ///
    /// `limit` is the page size for keyset strategies; one extra row is
    /// fetched so the assembler can tell whether another page exists.
    /// The offset strategy takes its size from the descriptor and fetches
    /// exactly one page; its total comes from a separate count.
    pub fn build(position: &PositionDescriptor, limit: u64) -> Result<RangeQuery> {
        let over_fetch = limit.max(1).saturating_add(1);

        let query = match position {
            PositionDescriptor::Offset(offset) => RangeQuery {
                order: OrderKey::Id,
                lower_bound: None,
                offset: offset.offset()?,
                fetch: offset.page_size.max(1),
            },
            PositionDescriptor::Cursor(cursor) => RangeQuery {
                order: OrderKey::Id,
                lower_bound: (cursor.last_id > 0).then_some(LowerBound::Id(cursor.last_id)),
                offset: 0,
                fetch: over_fetch,
            },
            PositionDescriptor::Seek(seek) => RangeQuery {
                order: OrderKey::CreatedAtId,
                lower_bound: seek.bound.map(|b| LowerBound::CreatedAtId {
                    last_created_at: b.last_created_at,
                    last_id: b.last_id,
                }),
                offset: 0,
                fetch: over_fetch,
            },
            PositionDescriptor::Token(token) => RangeQuery {
                order: OrderKey::CreatedAtId,
                lower_bound: token.bound.map(|b| LowerBound::CreatedAtId {
                    last_created_at: b.last_created_at,
                    last_id: b.last_id,
                }),
                offset: 0,
                fetch: over_fetch,
            },
        };

        tracing::debug!(
            strategy = %position.kind(),
            ?query,
            "built range query"
        );

        Ok(query)
    }
}
