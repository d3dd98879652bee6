//! Continuation token encoding and decoding
//!
//! Wire format: URL-safe base64 (no padding) of a JSON object
//! `{"v":1,"last_id":..,"last_created_at":..,"page":..}`.
//! The version discriminant lets a future layout be detected and refused
//! instead of being misread.

use crate::error::{Error, Result};
use crate::types::Timestamp;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

/// Current token layout version
pub const TOKEN_VERSION: u8 = 1;

/// Upper bound on accepted token length, checked before any decoding
pub const MAX_TOKEN_LEN: usize = 1024;

const FIELD: &str = "token";

/// Position carried inside a continuation token
///
/// `page` only labels responses. The resume point is governed by
/// `(last_created_at, last_id)` alone, so a client that rewrites `page`
/// changes the displayed counter and nothing else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContinuationToken {
    /// Id of the last record on the previous page
    pub last_id: u64,
    /// Creation time of the last record on the previous page
    pub last_created_at: Timestamp,
    /// Number of pages served before this token was issued
    pub page: u64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct WireToken {
    v: u8,
    last_id: u64,
    last_created_at: Timestamp,
    page: u64,
}

/// Encodes and decodes continuation tokens
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenCodec;

impl TokenCodec {
    /// Encode a position into an opaque token
    pub fn encode(token: &ContinuationToken) -> Result<String> {
        let wire = WireToken {
            v: TOKEN_VERSION,
            last_id: token.last_id,
            last_created_at: token.last_created_at,
            page: token.page,
        };
        let bytes = serde_json::to_vec(&wire)?;
        Ok(URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Decode an opaque token back into a position
    ///
    /// Every failure is an invalid argument: the token came from the client.
    pub fn decode(raw: &str) -> Result<ContinuationToken> {
        if raw.is_empty() {
            return Err(Error::invalid_argument(FIELD, "token is empty"));
        }
        if raw.len() > MAX_TOKEN_LEN {
            return Err(Error::invalid_argument(
                FIELD,
                format!("token is {} characters long (max {MAX_TOKEN_LEN})", raw.len()),
            ));
        }

        let bytes = URL_SAFE_NO_PAD
            .decode(raw)
            .map_err(|e| Error::invalid_argument(FIELD, format!("invalid token encoding: {e}")))?;

        let wire: WireToken = serde_json::from_slice(&bytes)
            .map_err(|e| Error::invalid_argument(FIELD, format!("invalid token format: {e}")))?;

        if wire.v != TOKEN_VERSION {
            return Err(Error::invalid_argument(
                FIELD,
                format!("unsupported token version {}", wire.v),
            ));
        }

        Ok(ContinuationToken {
            last_id: wire.last_id,
            last_created_at: wire.last_created_at,
            page: wire.page,
        })
    }
}
