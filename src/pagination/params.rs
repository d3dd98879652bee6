//! Query parameter decoding
//!
//! The transport hands over named, string-typed fields. An absent or empty
//! field takes its default; a present field that doesn't parse is an
//! invalid argument rather than a silent zero.

use super::types::{
    CursorPosition, CursorRequest, OffsetPosition, SeekPosition, SeekRequest, TokenPosition,
    TokenRequest,
};
use crate::config::PaginationLimits;
use crate::error::{Error, Result};
use crate::token::TokenCodec;
use crate::types::parse_timestamp;
use serde::Deserialize;

/// Raw offset query: `?page=&page_size=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OffsetQuery {
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Raw cursor query: `?cursor=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CursorQuery {
    pub cursor: Option<String>,
    pub limit: Option<String>,
}

/// Raw seek query: `?last_id=&last_created_at=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeekQuery {
    pub last_id: Option<String>,
    pub last_created_at: Option<String>,
    pub limit: Option<String>,
}

/// Raw token query: `?token=&limit=`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
    pub limit: Option<String>,
}

/// Decodes raw queries into validated strategy inputs
#[derive(Debug, Clone, Copy, Default)]
pub struct ParamDecoder {
    limits: PaginationLimits,
}

impl ParamDecoder {
    /// Create a decoder with the given page size bounds
    pub fn new(limits: PaginationLimits) -> Self {
        Self { limits }
    }

    /// Page size bounds in use
    pub fn limits(&self) -> PaginationLimits {
        self.limits
    }

    /// Decode an offset request
    pub fn offset(&self, query: &OffsetQuery) -> Result<OffsetPosition> {
        let page = parse_count("page", query.page.as_deref(), 1)?;
        let page_size = self.page_size("page_size", query.page_size.as_deref())?;
        let position = OffsetPosition::new(page, page_size);
        // reject pages whose row offset can't be represented
        position.offset()?;
        Ok(position)
    }

    /// Decode a cursor request
    pub fn cursor(&self, query: &CursorQuery) -> Result<CursorRequest> {
        let last_id = parse_id("cursor", query.cursor.as_deref())?.unwrap_or(0);
        let limit = self.page_size("limit", query.limit.as_deref())?;
        Ok(CursorRequest::new(CursorPosition::new(last_id), limit))
    }

    /// Decode a seek request
    pub fn seek(&self, query: &SeekQuery) -> Result<SeekRequest> {
        let last_id = present(query.last_id.as_deref());
        let last_created_at = present(query.last_created_at.as_deref());

        let position = match (last_id, last_created_at) {
            (Some(id), Some(ts)) => {
                let id = parse_id("last_id", Some(id))?.unwrap_or(0);
                let ts = parse_timestamp("last_created_at", ts)?;
                SeekPosition::after(id, ts)
            }
            (None, None) => SeekPosition::default(),
            (Some(_), None) => {
                return Err(Error::invalid_argument(
                    "last_created_at",
                    "required when last_id is given",
                ))
            }
            (None, Some(_)) => {
                return Err(Error::invalid_argument(
                    "last_id",
                    "required when last_created_at is given",
                ))
            }
        };

        let limit = self.page_size("limit", query.limit.as_deref())?;
        Ok(SeekRequest::new(position, limit))
    }

    /// Decode a token request
    pub fn token(&self, query: &TokenQuery) -> Result<TokenRequest> {
        let position = match present(query.token.as_deref()) {
            Some(raw) => TokenPosition::from(TokenCodec::decode(raw)?),
            None => TokenPosition::default(),
        };
        let limit = self.page_size("limit", query.limit.as_deref())?;
        Ok(TokenRequest::new(position, limit))
    }

    fn page_size(&self, field: &str, raw: Option<&str>) -> Result<u64> {
        let size = parse_count(field, raw, self.limits.default_limit)?;
        if size > self.limits.max_limit {
            return Err(Error::invalid_argument(
                field,
                format!("{size} exceeds the maximum of {}", self.limits.max_limit),
            ));
        }
        Ok(size)
    }
}

/// Treat an empty field like an absent one
fn present(raw: Option<&str>) -> Option<&str> {
    raw.filter(|s| !s.is_empty())
}

/// Parse a count that is clamped to at least 1
fn parse_count(field: &str, raw: Option<&str>, default: u64) -> Result<u64> {
    let Some(raw) = present(raw) else {
        return Ok(default);
    };

    match raw.parse::<i128>() {
        Ok(value) if value < 1 => Ok(1),
        Ok(value) => u64::try_from(value)
            .map_err(|_| Error::invalid_argument(field, format!("{raw} is out of range"))),
        Err(_) => Err(Error::invalid_argument(
            field,
            format!("expected an integer, got '{raw}'"),
        )),
    }
}

/// Parse an unsigned decimal record id
fn parse_id(field: &str, raw: Option<&str>) -> Result<Option<u64>> {
    present(raw)
        .map(|raw| {
            raw.parse::<u64>().map_err(|_| {
                Error::invalid_argument(field, format!("expected an unsigned integer, got '{raw}'"))
            })
        })
        .transpose()
}
