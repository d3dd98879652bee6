//! HTTP transport for the pagination strategies
//!
//! Each strategy gets one read-only `GET` endpoint. Query fields are taken
//! as strings and decoded by [`ParamDecoder`]; errors are reported as
//! `{"error": "..."}` with a status that separates client mistakes, store
//! failures and cancellations.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::{PaginationLimits, ServiceConfig};
use crate::database::SharedStore;
use crate::error::{Error, Result};
use crate::pagination::{
    CursorPaginator, CursorQuery, OffsetPaginator, OffsetQuery, ParamDecoder, Paginator,
    RequestContext, SeekPaginator, SeekQuery, StrategyKind, TokenPaginator, TokenQuery,
};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Deadline applied to each request's store calls
    pub request_timeout: Option<Duration>,
    /// Page size defaults and bounds
    pub limits: PaginationLimits,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&ServiceConfig::default())
    }
}

impl From<&ServiceConfig> for ServerConfig {
    fn from(config: &ServiceConfig) -> Self {
        let timeout_ms = config.server.request_timeout_ms;
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            request_timeout: (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)),
            limits: config.pagination,
        }
    }
}

/// App state shared across handlers
struct AppState {
    store: SharedStore,
    decoder: ParamDecoder,
    request_timeout: Option<Duration>,
    /// Cancelled on shutdown; every request context is a child of it
    shutdown: CancellationToken,
}

impl AppState {
    fn context(&self) -> RequestContext {
        let ctx = RequestContext::new().with_cancellation(self.shutdown.child_token());
        match self.request_timeout {
            Some(timeout) => ctx.with_deadline(tokio::time::Instant::now() + timeout),
            None => ctx,
        }
    }
}

/// Build the router over a store
pub fn router(store: SharedStore, config: &ServerConfig) -> Router {
    build_router(store, config, CancellationToken::new())
}

fn build_router(store: SharedStore, config: &ServerConfig, shutdown: CancellationToken) -> Router {
    let state = AppState {
        store,
        decoder: ParamDecoder::new(config.limits),
        request_timeout: config.request_timeout,
        shutdown,
    };

    // Read-only endpoints, so any origin may call them
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/products/offset", get(offset_page))
        .route("/products/cursor", get(cursor_page))
        .route("/products/seek", get(seek_page))
        .route("/products/token", get(token_page))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(Arc::new(state))
}

/// Start the HTTP server
pub async fn serve(store: SharedStore, config: ServerConfig) -> Result<()> {
    let shutdown = CancellationToken::new();
    let app = build_router(store, &config, shutdown.clone());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| Error::config(format!("Invalid listen address: {e}")))?;
    tracing::info!("Starting HTTP server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Error::config(format!("Failed to bind to {addr}: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down, cancelling in-flight requests");
            shutdown.cancel();
        })
        .await
        .map_err(|e| Error::config(format!("Server error: {e}")))?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<Arc<AppState>>) -> Response {
    let ctx = state.context();
    match ctx.guard("health check", state.store.check()).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "ok" }))).into_response(),
        Err(e) => {
            tracing::warn!("Health check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unavailable", "error": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn offset_page(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<OffsetQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let request = state.decoder.offset(&query_params(query)?)?;
        OffsetPaginator
            .paginate(state.store.as_ref(), request, &state.context())
            .await
    }
    .await;
    respond(StrategyKind::Offset, result)
}

async fn cursor_page(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<CursorQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let request = state.decoder.cursor(&query_params(query)?)?;
        CursorPaginator
            .paginate(state.store.as_ref(), request, &state.context())
            .await
    }
    .await;
    respond(StrategyKind::Cursor, result)
}

async fn seek_page(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<SeekQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let request = state.decoder.seek(&query_params(query)?)?;
        SeekPaginator
            .paginate(state.store.as_ref(), request, &state.context())
            .await
    }
    .await;
    respond(StrategyKind::Seek, result)
}

async fn token_page(
    State(state): State<Arc<AppState>>,
    query: std::result::Result<Query<TokenQuery>, QueryRejection>,
) -> Response {
    let result = async {
        let request = state.decoder.token(&query_params(query)?)?;
        TokenPaginator
            .paginate(state.store.as_ref(), request, &state.context())
            .await
    }
    .await;
    respond(StrategyKind::Token, result)
}

/// Unwrap extracted query fields, reporting a malformed query string
/// (duplicate or undecodable fields) as an invalid argument
fn query_params<T>(query: std::result::Result<Query<T>, QueryRejection>) -> Result<T> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| Error::invalid_argument("query", rejection.body_text()))
}

/// HTTP status for an error
fn status_for(error: &Error) -> StatusCode {
    if error.is_client_error() {
        StatusCode::BAD_REQUEST
    } else if error.is_cancelled() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Either the whole page or an error, never both
fn respond<T: Serialize>(strategy: StrategyKind, result: Result<T>) -> Response {
    match result {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            let status = status_for(&e);
            if status.is_server_error() {
                tracing::warn!(%strategy, status = status.as_u16(), "{e}");
            } else {
                tracing::debug!(%strategy, "rejected request: {e}");
            }
            (status, Json(json!({ "error": e.to_string() }))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_for(&Error::invalid_argument("limit", "bad")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::store("down")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&Error::cancelled("deadline")),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_server_config_from_service_config() {
        let mut service = ServiceConfig::default();
        service.server.request_timeout_ms = 0;
        let config = ServerConfig::from(&service);
        assert_eq!(config.request_timeout, None);
        assert_eq!(config.port, 8080);

        let config = ServerConfig::default();
        assert_eq!(config.request_timeout, Some(Duration::from_millis(5000)));
    }
}
