//! HTTP surface of the pipeline.
//!
//! Routes:
//! - `POST /rag/upload`: multipart form with a `file` field
//! - `POST /rag/ask`: JSON `{question, topK?, allowGeneralKnowledge?}`
//! - `GET /health`: liveness probe
//! - `GET /`: banner

mod error;
mod routes;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, HeaderValue, Method};
use axum::routing::{get, post};
use axum::Router;
use ragdesk_core::config::ServerConfig;
use ragdesk_core::{AppError, AppResult};
use ragdesk_knowledge::RagPipeline;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Room for multipart boundaries and part headers on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<RagPipeline>,
    /// Largest accepted file, checked on the file itself
    pub max_upload_bytes: usize,
}

/// Build the router around a shared pipeline.
pub fn router(pipeline: Arc<RagPipeline>, config: &ServerConfig) -> AppResult<Router> {
    let upload_limit = config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD);
    let state = AppState {
        pipeline,
        max_upload_bytes: config.max_upload_bytes,
    };

    let router = Router::new()
        .route("/", get(routes::banner))
        .route("/health", get(routes::health))
        .route(
            "/rag/upload",
            post(routes::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/rag/ask", post(routes::ask))
        .layer(cors_layer(&config.cors_origins)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(router)
}

/// Any origin when none are configured.
fn cors_layer(origins: &[String]) -> AppResult<CorsLayer> {
    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        let values = origins
            .iter()
            .map(|origin| {
                HeaderValue::from_str(origin).map_err(|e| {
                    AppError::Config(format!("Invalid CORS origin {:?}: {}", origin, e))
                })
            })
            .collect::<AppResult<Vec<_>>>()?;
        AllowOrigin::list(values)
    };

    Ok(CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .allow_origin(allow_origin))
}

/// Bind, serve until Ctrl-C, then drain in-flight requests.
pub async fn serve(pipeline: Arc<RagPipeline>, config: &ServerConfig) -> AppResult<()> {
    let app = router(pipeline, config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .map_err(|e| AppError::Config(format!("Failed to bind {}: {}", config.bind, e)))?;

    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping server...");
}
