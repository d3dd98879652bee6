//! Pagination module
//!
//! Supports: Offset, Cursor, Seek (keyset), Continuation Token
//!
//! # Overview
//!
//! A request flows through the same pipeline for every strategy:
//!
//! ```text
//! query params ─▶ ParamDecoder ─▶ PositionDescriptor ─▶ RangeQueryBuilder
//!                   (token codec)                            │
//!                                                            ▼
//!   response ◀── strategy ◀── PageAssembler ◀──────── RecordStore
//! ```
//!
//! Keyset strategies fetch one row more than requested to learn whether
//! another page exists without a count query. The offset strategy issues an
//! independent count instead.

mod assembler;
mod context;
mod params;
mod query;
mod strategies;
mod types;

pub use assembler::PageAssembler;
pub use context::RequestContext;
pub use params::{CursorQuery, OffsetQuery, ParamDecoder, SeekQuery, TokenQuery};
pub use query::{LowerBound, OrderKey, RangeQuery, RangeQueryBuilder};
pub use strategies::{CursorPaginator, OffsetPaginator, Paginator, SeekPaginator, TokenPaginator};
pub use types::{
    CursorPage, CursorPosition, CursorRequest, OffsetPage, OffsetPosition, PageRequest,
    PageResult, PositionDescriptor, SeekBound, SeekPage, SeekPosition, SeekRequest, StrategyKind,
    TokenPage, TokenPosition, TokenRequest,
};
