//! Continuation token module
//!
//! Opaque, transport-safe encoding of a keyset position. Tokens are only
//! meaningful to the token strategy that issued them.

mod codec;

pub use codec::{ContinuationToken, TokenCodec, MAX_TOKEN_LEN, TOKEN_VERSION};
