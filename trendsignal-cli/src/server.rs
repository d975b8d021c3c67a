//! HTTP surface: `GET /signals` and `GET /health`.
//!
//! Every `/signals` call runs the full pipeline on a blocking worker thread;
//! there is no caching between requests.

use crate::Sources;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use trendsignal_core::domain::InstrumentSignal;
use trendsignal_core::{PipelineError, SignalConfig};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<SignalConfig>,
    sources: Sources,
}

impl AppState {
    pub fn new(config: SignalConfig, sources: Sources) -> Self {
        Self {
            config: Arc::new(config),
            sources,
        }
    }
}

/// Batch-fatal failure rendered as `500 {"error": "..."}`.
#[derive(Debug)]
pub struct ApiError(String);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self.0, "signal request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({ "error": self.0 })),
        )
            .into_response()
    }
}

async fn signals(State(state): State<AppState>) -> Result<Json<Vec<InstrumentSignal>>, ApiError> {
    let rows = tokio::task::spawn_blocking(move || state.sources.run(&state.config))
        .await
        .map_err(|e| ApiError(format!("signal worker failed: {e}")))??;
    Ok(Json(rows))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/signals", get(signals))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("trendsignal v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
