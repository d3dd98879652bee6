// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Pagewise
//!
//! A product catalog service that exposes the same ordered collection
//! through four interchangeable pagination strategies, so their behaviour
//! under concurrent writes can be compared side by side.
//!
//! ## Strategies
//!
//! - **Offset**: `page` and `page_size`, with a total count
//! - **Cursor**: resume after the last seen `id`
//! - **Seek**: resume after the last seen `(created_at, id)`
//! - **Token**: the seek position wrapped in an opaque, versioned token
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pagewise::database::MemoryStore;
//! use pagewise::pagination::{CursorPaginator, CursorPosition, CursorRequest, Paginator, RequestContext};
//!
//! let store = MemoryStore::with_sample_products(25);
//! let request = CursorRequest::new(CursorPosition::new(10), 10);
//! let page = CursorPaginator
//!     .paginate(&store, request, &RequestContext::new())
//!     .await?;
//! assert_eq!(page.next_cursor, "20");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │            HTTP (axum)  /products/{offset,cursor,seek,token}    │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────┬───────────────┴───────┬─────────────────────────┐
//! │ ParamDecoder │   Paginator (x4)      │  TokenCodec             │
//! ├──────────────┼───────────────────────┼─────────────────────────┤
//! │ defaults     │ RangeQueryBuilder     │ base64url(JSON)         │
//! │ limit bounds │ PageAssembler         │ versioned, size-capped  │
//! │ timestamps   │ RequestContext        │                         │
//! └──────────────┴───────────┬───────────┴─────────────────────────┘
//!                            │
//! ┌──────────────────────────┴──────────────────────────────────────┐
//! │              RecordStore: MemoryStore | DuckDbStore             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Record type and timestamp helpers
pub mod types;

/// Service configuration
pub mod config;

/// Continuation token codec
pub mod token;

/// Pagination strategies
pub mod pagination;

/// Record stores (in-memory and DuckDB)
pub mod database;

/// Command-line interface and HTTP server
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::ServiceConfig;
pub use database::{DuckDbStore, MemoryStore, RecordStore};
pub use pagination::{Paginator, RequestContext, StrategyKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
