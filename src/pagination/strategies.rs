//! Pagination strategy implementations
//!
//! Each strategy turns a decoded request into one page, using the shared
//! query builder and page assembler. The store is passed in per call; no
//! strategy holds state between requests.

use super::assembler::PageAssembler;
use super::context::RequestContext;
use super::query::RangeQueryBuilder;
use super::types::{
    CursorPage, CursorRequest, OffsetPage, OffsetPosition, PageResult, PositionDescriptor,
    SeekPage, SeekRequest, StrategyKind, TokenPage, TokenRequest,
};
use crate::database::RecordStore;
use crate::error::Result;
use crate::token::{ContinuationToken, TokenCodec};
use crate::types::format_timestamp;
use async_trait::async_trait;
use serde::Serialize;

/// Core trait for pagination strategies
#[async_trait]
pub trait Paginator: Send + Sync {
    /// Decoded strategy input
    type Request: Send + 'static;
    /// Response body
    type Page: Serialize + Send;

    /// Which strategy this is
    fn kind(&self) -> StrategyKind;

    /// Fetch one page
    async fn paginate(
        &self,
        store: &dyn RecordStore,
        request: Self::Request,
        ctx: &RequestContext,
    ) -> Result<Self::Page>;
}

/// Run the fetch-N+1 protocol for a keyset-style descriptor
async fn fetch_page(
    store: &dyn RecordStore,
    position: PositionDescriptor,
    limit: u64,
    ctx: &RequestContext,
) -> Result<PageResult> {
    let query = RangeQueryBuilder::build(&position, limit)?;
    let fetched = ctx.guard("range scan", store.scan(&query)).await?;
    let page = PageAssembler::assemble(&position, fetched, limit);

    tracing::debug!(
        strategy = %position.kind(),
        limit,
        items = page.items.len(),
        has_more = page.has_more,
        "assembled page"
    );

    Ok(page)
}

// ============================================================================
// Offset Pagination
// ============================================================================

/// Offset-based pagination
///
/// Position is a row count, so a collection mutated between requests can
/// make later pages skip or repeat records. That drift is accepted behaviour
/// of this strategy; the keyset strategies don't have it.
#[derive(Debug, Clone, Copy, Default)]
pub struct OffsetPaginator;

#[async_trait]
impl Paginator for OffsetPaginator {
    type Request = OffsetPosition;
    type Page = OffsetPage;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Offset
    }

    async fn paginate(
        &self,
        store: &dyn RecordStore,
        request: OffsetPosition,
        ctx: &RequestContext,
    ) -> Result<OffsetPage> {
        let position = PositionDescriptor::Offset(request);
        let query = RangeQueryBuilder::build(&position, request.page_size)?;

        // the count is independent of the page, so both run at once
        let (total, items) = futures::try_join!(
            ctx.guard("count", store.count()),
            ctx.guard("range scan", store.scan(&query)),
        )?;

        tracing::debug!(
            page = request.page,
            page_size = request.page_size,
            total,
            items = items.len(),
            "assembled offset page"
        );

        Ok(PageAssembler::assemble_offset(&request, items, total))
    }
}

// ============================================================================
// Cursor Pagination
// ============================================================================

/// Cursor pagination on `id` alone
///
/// Stable under inserts with higher ids. Deleting an already returned id
/// doesn't disturb it either: the cursor is a position, not an index.
#[derive(Debug, Clone, Copy, Default)]
pub struct CursorPaginator;

#[async_trait]
impl Paginator for CursorPaginator {
    type Request = CursorRequest;
    type Page = CursorPage;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Cursor
    }

    async fn paginate(
        &self,
        store: &dyn RecordStore,
        request: CursorRequest,
        ctx: &RequestContext,
    ) -> Result<CursorPage> {
        let page = fetch_page(
            store,
            PositionDescriptor::Cursor(request.position),
            request.limit,
            ctx,
        )
        .await?;

        let next_cursor = match page.next {
            Some(PositionDescriptor::Cursor(next)) => next.last_id.to_string(),
            _ => String::new(),
        };

        Ok(CursorPage {
            data: page.items,
            next_cursor,
            has_more: page.has_more,
        })
    }
}

// ============================================================================
// Seek Pagination
// ============================================================================

/// Keyset pagination on `(created_at, id)`
///
/// Inserts that sort before the resume point are never seen; ties on
/// `created_at` are broken by `id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeekPaginator;

#[async_trait]
impl Paginator for SeekPaginator {
    type Request = SeekRequest;
    type Page = SeekPage;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Seek
    }

    async fn paginate(
        &self,
        store: &dyn RecordStore,
        request: SeekRequest,
        ctx: &RequestContext,
    ) -> Result<SeekPage> {
        let page = fetch_page(
            store,
            PositionDescriptor::Seek(request.position),
            request.limit,
            ctx,
        )
        .await?;

        let (next_last_id, next_last_created_at) = match page.next {
            Some(PositionDescriptor::Seek(next)) => next.bound.map_or_else(
                || (String::new(), String::new()),
                |b| (b.last_id.to_string(), format_timestamp(&b.last_created_at)),
            ),
            _ => (String::new(), String::new()),
        };

        Ok(SeekPage {
            data: page.items,
            next_last_id,
            next_last_created_at,
            has_more: page.has_more,
        })
    }
}

// ============================================================================
// Token Pagination
// ============================================================================

/// Keyset pagination behind an opaque continuation token
///
/// Same ordering and predicate as [`SeekPaginator`]. The page counter in the
/// token is echoed and incremented but never used to position the scan, so a
/// client that resets or forges it only changes the reported `page`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenPaginator;

#[async_trait]
impl Paginator for TokenPaginator {
    type Request = TokenRequest;
    type Page = TokenPage;

    fn kind(&self) -> StrategyKind {
        StrategyKind::Token
    }

    async fn paginate(
        &self,
        store: &dyn RecordStore,
        request: TokenRequest,
        ctx: &RequestContext,
    ) -> Result<TokenPage> {
        let page = fetch_page(
            store,
            PositionDescriptor::Token(request.position),
            request.limit,
            ctx,
        )
        .await?;

        let next_token = match page.next {
            Some(PositionDescriptor::Token(next)) => match next.bound {
                Some(bound) => TokenCodec::encode(&ContinuationToken {
                    last_id: bound.last_id,
                    last_created_at: bound.last_created_at,
                    page: next.page,
                })?,
                None => String::new(),
            },
            _ => String::new(),
        };

        Ok(TokenPage {
            data: page.items,
            next_token,
            has_more: page.has_more,
            page: request.position.page.saturating_add(1),
        })
    }
}
