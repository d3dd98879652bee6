//! CLI module
//!
//! Command-line interface for the pagination service.
//!
//! # Commands
//!
//! - `serve` - Start the HTTP service
//! - `check` - Verify the record store is reachable
//! - `walk` - Page through the whole collection with one strategy
//! - `decode-token` - Show what a continuation token contains

mod commands;
mod runner;
mod server;

pub use commands::{Cli, Commands};
pub use runner::{open_store, Runner};
pub use server::{router, serve, ServerConfig};
