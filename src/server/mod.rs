//! HTTP API.
//!
//! Every route is served both at the root and under `/api`:
//!
//! | Method | Path                  | Body                                              |
//! |--------|-----------------------|---------------------------------------------------|
//! | GET    | `/health`             |                                                   |
//! | POST   | `/generate-questions` | `{examDetails, questionConfig, extractedTexts}`   |
//! | POST   | `/extract-text`       | raw PDF bytes (`X-File-Name` header optional)     |
//! | POST   | `/export`             | `{examDetails, questions}`                        |
//!
//! Errors are returned as `{"error": "..."}` with a 4xx or 5xx status.

mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::DEFAULT_BODY_LIMIT_BYTES;
use crate::export::Exporter;
use crate::generator::QuestionGenerator;

pub use handlers::{
    ApiError, ErrorBody, ExportRequest, ExtractResponse, GenerateRequest, HealthResponse,
    FILE_NAME_HEADER, GENERATION_FAILED_MESSAGE, MISSING_FIELDS_MESSAGE,
};

/// Shared state handed to every handler.
#[derive(Debug)]
pub struct AppState {
    pub generator: QuestionGenerator,
    pub exporter: Exporter,
}

impl AppState {
    pub fn new(generator: QuestionGenerator) -> Self {
        Self {
            generator,
            exporter: Exporter::default(),
        }
    }

    pub fn with_exporter(mut self, exporter: Exporter) -> Self {
        self.exporter = exporter;
        self
    }
}

/// Builds the router with the default body limit.
pub fn router(state: AppState) -> Router {
    router_with_limit(state, DEFAULT_BODY_LIMIT_BYTES)
}

/// Builds the router, accepting request bodies up to `body_limit` bytes.
pub fn router_with_limit(state: AppState, body_limit: usize) -> Router {
    let routes = Router::new()
        .route("/health", get(handlers::health))
        .route("/generate-questions", post(handlers::generate_questions))
        .route("/extract-text", post(handlers::extract_text))
        .route("/export", post(handlers::export));

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .with_state(Arc::new(state))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Serves `app` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("Server running on http://{}", addr);
    }
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
