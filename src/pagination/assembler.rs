//! Page assembly
//!
//! Keyset strategies fetch `limit + 1` rows; the extra row only signals that
//! another page exists and is never returned. The offset strategy instead
//! derives its metadata from an independent count.

use super::types::{OffsetPage, OffsetPosition, PageResult, PositionDescriptor};
use crate::types::Record;

/// Turns raw store rows into pages
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAssembler;

impl PageAssembler {
    /// Apply the fetch-N+1 protocol
    ///
    /// The next descriptor is taken from the last *retained* record.
    pub fn assemble(
        position: &PositionDescriptor,
        mut fetched: Vec<Record>,
        limit: u64,
    ) -> PageResult {
        let limit = usize::try_from(limit.max(1)).unwrap_or(usize::MAX);

        if fetched.len() <= limit {
            return PageResult {
                items: fetched,
                has_more: false,
                next: None,
            };
        }

        fetched.truncate(limit);
        let next = fetched.last().map(|last| position.advance(last));

        PageResult {
            items: fetched,
            has_more: true,
            next,
        }
    }

    /// Build the offset response from one page of rows and the total count
    pub fn assemble_offset(position: &OffsetPosition, items: Vec<Record>, total: u64) -> OffsetPage {
        OffsetPage {
            data: items,
            total,
            page: position.page,
            page_size: position.page_size,
            total_page: Self::total_pages(total, position.page_size),
        }
    }

    /// `ceil(total / page_size)` in integer arithmetic
    pub fn total_pages(total: u64, page_size: u64) -> u64 {
        total.div_ceil(page_size.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::types::{CursorPosition, SeekBound, TokenPosition};
    use chrono::{TimeZone, Utc};
    use test_case::test_case;

    fn records(ids: std::ops::RangeInclusive<u64>) -> Vec<Record> {
        ids.map(|id| {
            Record::new(
                id,
                format!("p{id}"),
                1.0,
                Utc.timestamp_opt(1_700_000_000 + id as i64, 0).single().unwrap(),
            )
        })
        .collect()
    }

    #[test]
    fn test_over_fetch_sets_has_more_and_trims() {
        let position = PositionDescriptor::Cursor(CursorPosition::new(0));
        let page = PageAssembler::assemble(&position, records(1..=11), 10);

        assert!(page.has_more);
        assert_eq!(page.items.len(), 10);
        assert_eq!(page.items.last().unwrap().id, 10);
        // the discarded 11th row must not leak into the cursor
        assert_eq!(
            page.next,
            Some(PositionDescriptor::Cursor(CursorPosition::new(10)))
        );
    }

    #[test]
    fn test_short_page_has_no_next() {
        let position = PositionDescriptor::Cursor(CursorPosition::new(20));
        let page = PageAssembler::assemble(&position, records(21..=25), 10);

        assert!(!page.has_more);
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_exact_page_has_no_next() {
        let position = PositionDescriptor::Cursor(CursorPosition::new(0));
        let page = PageAssembler::assemble(&position, records(1..=10), 10);
        assert!(!page.has_more);
        assert_eq!(page.next, None);
    }

    #[test]
    fn test_empty_fetch() {
        let position = PositionDescriptor::Cursor(CursorPosition::new(99));
        let page = PageAssembler::assemble(&position, Vec::new(), 10);
        assert!(page.items.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn test_limit_one() {
        let position = PositionDescriptor::Cursor(CursorPosition::new(0));
        let page = PageAssembler::assemble(&position, records(1..=2), 1);
        assert_eq!(page.items.len(), 1);
        assert!(page.has_more);
    }

    #[test]
    fn test_token_advance_bumps_page_counter() {
        let position = PositionDescriptor::Token(TokenPosition {
            bound: None,
            page: 4,
        });
        let fetched = records(1..=4);
        let expected_bound = SeekBound::from(&fetched[2]);

        let page = PageAssembler::assemble(&position, fetched, 3);
        assert_eq!(
            page.next,
            Some(PositionDescriptor::Token(TokenPosition {
                bound: Some(expected_bound),
                page: 5,
            }))
        );
    }

    #[test_case(25, 10 => 3)]
    #[test_case(30, 10 => 3)]
    #[test_case(31, 10 => 4)]
    #[test_case(0, 10 => 0)]
    #[test_case(1, 1 => 1)]
    #[test_case(9, 10 => 1)]
    #[test_case(u64::MAX, 1 => u64::MAX)]
    fn test_total_pages(total: u64, page_size: u64) -> u64 {
        PageAssembler::total_pages(total, page_size)
    }

    #[test]
    fn test_assemble_offset_uses_count_not_page_len() {
        let page = PageAssembler::assemble_offset(&OffsetPosition::new(3, 10), records(21..=25), 25);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_page, 3);
        assert_eq!(page.page, 3);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.data.len(), 5);
    }
}
