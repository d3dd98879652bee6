//! CLI commands and argument parsing

use crate::pagination::StrategyKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pagewise pagination service CLI
#[derive(Parser, Debug)]
#[command(name = "pagewise")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// DuckDB database file to read records from (`:memory:` allowed)
    #[arg(short, long, global = true, conflicts_with = "seed")]
    pub database: Option<String>,

    /// Table holding the records
    #[arg(short, long, global = true)]
    pub table: Option<String>,

    /// Serve an in-memory store seeded with this many sample products
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP service
    Serve {
        /// Interface to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Per-request store deadline in milliseconds (0 disables it)
        #[arg(long)]
        timeout_ms: Option<u64>,
    },

    /// Check that the record store is reachable
    Check,

    /// Page through the whole collection, one JSON page per line
    Walk {
        /// Strategy to paginate with
        #[arg(short, long, value_enum, default_value = "cursor")]
        strategy: StrategyKind,

        /// Page size
        #[arg(short, long)]
        limit: Option<u64>,
    },

    /// Decode a continuation token
    DecodeToken {
        /// Token as returned in `next_token`
        token: String,
    },
}
