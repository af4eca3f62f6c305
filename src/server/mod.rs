//! HTTP surface: upload a PDF, get a summary back.

mod error;
mod handlers;
mod upload;

pub use error::ApiError;
pub use handlers::ApiResponse;

use axum::extract::DefaultBodyLimit;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::summarizer::Summarizer;

/// Shared state for the web server. Read-only; each request builds its own
/// provider adapter.
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
}

impl AppState {
    pub fn new(summarizer: Summarizer) -> Self {
        Self {
            summarizer: Arc::new(summarizer),
        }
    }
}

/// Build the router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.summarizer.config().server.max_upload_bytes);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::root))
        .route("/api", get(handlers::api_root))
        .route("/api/", get(handlers::api_root))
        .route("/api/summarize", post(handlers::summarize))
        .layer(body_limit)
        .layer(cors)
        .with_state(state)
}

/// Start the web server and run until Ctrl-C.
pub async fn serve(summarizer: Summarizer, host: &str, port: u16) -> anyhow::Result<()> {
    let app = create_router(AppState::new(summarizer));

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting API server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
