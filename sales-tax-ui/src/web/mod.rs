//! HTTP front end: the catalog, sale workflow and calculator as JSON.

pub mod error;
pub mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{Json, Router, routing::get};
use sales_tax_core::CatalogRepository;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;
use tracing::info;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;

/// Shared by every handler.
pub type AppState = Arc<dyn CatalogRepository>;

/// Full application: `/health` plus the API nested under `/api`.
pub fn build_app(repo: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", create_router())
        .layer(TraceLayer::new_for_http())
        .with_state(repo)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serves until Ctrl-C.
pub async fn serve(
    repo: AppState,
    addr: SocketAddr,
) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("cannot bind {addr}"))?;
    info!(addr = %listener.local_addr().unwrap_or(addr), "listening");

    axum::serve(listener, build_app(repo))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server stopped with an error")
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown requested");
    }
}
