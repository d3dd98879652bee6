//! Pagination types
//!
//! Position descriptors (where to resume), the assembled page, and the
//! per-strategy response bodies.

use crate::error::{Error, Result};
use crate::token::ContinuationToken;
use crate::types::{Record, Timestamp};
use serde::Serialize;
use std::fmt;

/// The four interchangeable pagination strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Page number and page size, position by row count
    Offset,
    /// Last seen id
    Cursor,
    /// Last seen `(created_at, id)`
    Seek,
    /// Opaque continuation token wrapping a seek position
    Token,
}

impl StrategyKind {
    /// Stable lowercase name, also used as the route suffix
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Offset => "offset",
            Self::Cursor => "cursor",
            Self::Seek => "seek",
            Self::Token => "token",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Position Descriptors
// ============================================================================

/// Offset position: 1-based page number and page size, both at least 1
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetPosition {
    pub page: u64,
    pub page_size: u64,
}

impl Default for OffsetPosition {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
        }
    }
}

impl OffsetPosition {
    /// Create an offset position, clamping both values to at least 1
    pub fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: page.max(1),
            page_size: page_size.max(1),
        }
    }

    /// Number of rows to skip
    pub fn offset(&self) -> Result<u64> {
        (self.page.max(1) - 1)
            .checked_mul(self.page_size)
            .ok_or_else(|| {
                Error::invalid_argument(
                    "page",
                    format!(
                        "page {} with page_size {} is out of range",
                        self.page, self.page_size
                    ),
                )
            })
    }
}

/// Cursor position: last seen id, 0 meaning "start"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CursorPosition {
    pub last_id: u64,
}

impl CursorPosition {
    pub fn new(last_id: u64) -> Self {
        Self { last_id }
    }
}

/// Composite keyset bound `(created_at, id)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeekBound {
    pub last_id: u64,
    pub last_created_at: Timestamp,
}

impl SeekBound {
    pub fn new(last_id: u64, last_created_at: Timestamp) -> Self {
        Self {
            last_id,
            last_created_at,
        }
    }
}

impl From<&Record> for SeekBound {
    fn from(record: &Record) -> Self {
        Self::new(record.id, record.created_at)
    }
}

/// Seek position: both bound fields present, or neither
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeekPosition {
    pub bound: Option<SeekBound>,
}

impl SeekPosition {
    /// Position resuming after the given key
    pub fn after(last_id: u64, last_created_at: Timestamp) -> Self {
        Self {
            bound: Some(SeekBound::new(last_id, last_created_at)),
        }
    }
}

/// Token position: a seek position plus the informational page counter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenPosition {
    pub bound: Option<SeekBound>,
    pub page: u64,
}

impl From<ContinuationToken> for TokenPosition {
    fn from(token: ContinuationToken) -> Self {
        Self {
            bound: Some(SeekBound::new(token.last_id, token.last_created_at)),
            page: token.page,
        }
    }
}

/// Where to resume, per strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionDescriptor {
    Offset(OffsetPosition),
    Cursor(CursorPosition),
    Seek(SeekPosition),
    Token(TokenPosition),
}

impl PositionDescriptor {
    /// Strategy this descriptor belongs to
    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Offset(_) => StrategyKind::Offset,
            Self::Cursor(_) => StrategyKind::Cursor,
            Self::Seek(_) => StrategyKind::Seek,
            Self::Token(_) => StrategyKind::Token,
        }
    }

    /// Descriptor that resumes right after `last`, the final record of a page
    pub fn advance(&self, last: &Record) -> Self {
        match self {
            Self::Offset(position) => Self::Offset(OffsetPosition {
                page: position.page.saturating_add(1),
                page_size: position.page_size,
            }),
            Self::Cursor(_) => Self::Cursor(CursorPosition::new(last.id)),
            Self::Seek(_) => Self::Seek(SeekPosition {
                bound: Some(SeekBound::from(last)),
            }),
            Self::Token(position) => Self::Token(TokenPosition {
                bound: Some(SeekBound::from(last)),
                page: position.page.saturating_add(1),
            }),
        }
    }
}

// ============================================================================
// Requests
// ============================================================================

/// A decoded request for a keyset-style strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest<P> {
    /// Resume point
    pub position: P,
    /// Maximum number of records to return, at least 1
    pub limit: u64,
}

impl<P> PageRequest<P> {
    pub fn new(position: P, limit: u64) -> Self {
        Self {
            position,
            limit: limit.max(1),
        }
    }
}

pub type CursorRequest = PageRequest<CursorPosition>;
pub type SeekRequest = PageRequest<SeekPosition>;
pub type TokenRequest = PageRequest<TokenPosition>;

// ============================================================================
// Results
// ============================================================================

/// Output of the fetch-N+1 protocol
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// At most `limit` records, in key order
    pub items: Vec<Record>,
    /// Whether at least one more record follows `items`
    pub has_more: bool,
    /// Where the next page starts; present only when `has_more`
    pub next: Option<PositionDescriptor>,
}

/// Offset strategy response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OffsetPage {
    pub data: Vec<Record>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_page: u64,
}

/// Cursor strategy response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPage {
    pub data: Vec<Record>,
    /// Decimal id of the last returned record, empty on the final page
    pub next_cursor: String,
    pub has_more: bool,
}

/// Seek strategy response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeekPage {
    pub data: Vec<Record>,
    /// Decimal id of the last returned record, empty on the final page
    pub next_last_id: String,
    /// RFC 3339 creation time of the last returned record, empty on the final page
    pub next_last_created_at: String,
    pub has_more: bool,
}

/// Token strategy response body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenPage {
    pub data: Vec<Record>,
    /// Opaque token for the next page, empty on the final page
    pub next_token: String,
    pub has_more: bool,
    /// Display counter; not used to position the scan
    pub page: u64,
}
