//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::cli::server::{serve, ServerConfig};
use crate::config::{ServiceConfig, StoreKind, StoreSettings};
use crate::database::{DuckDbStore, MemoryStore, SharedStore};
use crate::error::{Error, Result};
use crate::pagination::{
    CursorPaginator, CursorQuery, OffsetPaginator, OffsetQuery, ParamDecoder, Paginator,
    RequestContext, SeekPaginator, SeekQuery, StrategyKind, TokenPaginator, TokenQuery,
};
use crate::token::TokenCodec;
use crate::types::format_timestamp;
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Serve {
                host,
                port,
                timeout_ms,
            } => {
                let mut config = self.load_config()?;
                if let Some(host) = host {
                    config.server.host = host.clone();
                }
                if let Some(port) = port {
                    config.server.port = *port;
                }
                if let Some(timeout_ms) = timeout_ms {
                    config.server.request_timeout_ms = *timeout_ms;
                }
                self.serve(&config).await
            }
            Commands::Check => self.check().await,
            Commands::Walk { strategy, limit } => self.walk(*strategy, *limit).await,
            Commands::DecodeToken { token } => self.decode_token(token),
        }
    }

    /// Load the config file (if any) and apply the global store flags
    fn load_config(&self) -> Result<ServiceConfig> {
        let mut config = match &self.cli.config {
            Some(path) => ServiceConfig::from_file(path)?,
            None => ServiceConfig::default(),
        };

        if let Some(path) = &self.cli.database {
            config.store.kind = StoreKind::Duckdb;
            config.store.path = path.clone();
        }
        if let Some(table) = &self.cli.table {
            config.store.table = table.clone();
        }
        if let Some(seed) = self.cli.seed {
            config.store.kind = StoreKind::Memory;
            config.store.seed = seed;
        }

        config.validate()?;
        Ok(config)
    }

    /// Start the HTTP service
    async fn serve(&self, config: &ServiceConfig) -> Result<()> {
        let (store, info) = open_store(&config.store)?;
        tracing::info!("Serving records from {}", info);
        serve(store, ServerConfig::from(config)).await
    }

    /// Check store connectivity
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;
        let (store, info) = open_store(&config.store)?;

        let result = match store.check().await {
            Ok(()) => {
                let records = store.count().await?;
                json!({ "status": "SUCCEEDED", "store": info, "records": records })
            }
            Err(e) => json!({ "status": "FAILED", "store": info, "message": e.to_string() }),
        };

        println!("{}", serde_json::to_string(&result)?);
        Ok(())
    }

    /// Walk the collection page by page, feeding each page's continuation
    /// values back in as a client would
    async fn walk(&self, strategy: StrategyKind, limit: Option<u64>) -> Result<()> {
        let config = self.load_config()?;
        let (store, info) = open_store(&config.store)?;
        let decoder = ParamDecoder::new(config.pagination);
        let timeout_ms = config.server.request_timeout_ms;
        let context = || {
            if timeout_ms > 0 {
                RequestContext::with_timeout(Duration::from_millis(timeout_ms))
            } else {
                RequestContext::new()
            }
        };
        let limit = limit.map(|l| l.to_string());

        tracing::info!("Walking {} with {} pagination", info, strategy);
        let store = store.as_ref();
        let mut pages = 0u64;

        match strategy {
            StrategyKind::Offset => {
                let mut query = OffsetQuery {
                    page: None,
                    page_size: limit,
                };
                loop {
                    let request = decoder.offset(&query)?;
                    let page = OffsetPaginator.paginate(store, request, &context()).await?;
                    emit(&page)?;
                    pages += 1;
                    if page.data.is_empty() || page.page >= page.total_page {
                        break;
                    }
                    query.page = Some((page.page + 1).to_string());
                }
            }
            StrategyKind::Cursor => {
                let mut query = CursorQuery {
                    cursor: None,
                    limit,
                };
                loop {
                    let request = decoder.cursor(&query)?;
                    let page = CursorPaginator.paginate(store, request, &context()).await?;
                    emit(&page)?;
                    pages += 1;
                    if !page.has_more {
                        break;
                    }
                    query.cursor = Some(page.next_cursor);
                }
            }
            StrategyKind::Seek => {
                let mut query = SeekQuery {
                    last_id: None,
                    last_created_at: None,
                    limit,
                };
                loop {
                    let request = decoder.seek(&query)?;
                    let page = SeekPaginator.paginate(store, request, &context()).await?;
                    emit(&page)?;
                    pages += 1;
                    if !page.has_more {
                        break;
                    }
                    query.last_id = Some(page.next_last_id);
                    query.last_created_at = Some(page.next_last_created_at);
                }
            }
            StrategyKind::Token => {
                let mut query = TokenQuery { token: None, limit };
                loop {
                    let request = decoder.token(&query)?;
                    let page = TokenPaginator.paginate(store, request, &context()).await?;
                    emit(&page)?;
                    pages += 1;
                    if !page.has_more {
                        break;
                    }
                    query.token = Some(page.next_token);
                }
            }
        }

        tracing::info!("Walk complete: {} pages", pages);
        Ok(())
    }

    /// Print the contents of a continuation token
    fn decode_token(&self, raw: &str) -> Result<()> {
        let token = TokenCodec::decode(raw)?;
        let decoded = json!({
            "last_id": token.last_id,
            "last_created_at": format_timestamp(&token.last_created_at),
            "page": token.page,
        });
        println!("{}", serde_json::to_string_pretty(&decoded)?);
        Ok(())
    }
}

/// Open the configured record store, returning it with a description for logs
pub fn open_store(settings: &StoreSettings) -> Result<(SharedStore, String)> {
    match settings.kind {
        StoreKind::Memory => {
            let store = MemoryStore::with_sample_products(settings.seed);
            let info = format!("memory ({} sample products)", settings.seed);
            Ok((Arc::new(store), info))
        }
        StoreKind::Duckdb => {
            if settings.path.is_empty() {
                return Err(Error::config("store.path is required for the duckdb store"));
            }
            let store = DuckDbStore::open(&settings.path, settings.table.clone())?;
            let info = store.connection_info();
            Ok((Arc::new(store), info))
        }
    }
}

fn emit<T: Serialize>(page: &T) -> Result<()> {
    println!("{}", serde_json::to_string(page)?);
    Ok(())
}
