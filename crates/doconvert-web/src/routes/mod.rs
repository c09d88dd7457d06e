//! HTTP route handlers for the doconvert web server.
//!
//! POST routes take multipart uploads and answer with a file download;
//! failures come back as JSON `{"error": ...}`.

mod convert;
mod images;
mod merge;
mod status;
mod upload;

pub use convert::{convert_pdf_to_word, convert_presentation, convert_word};
pub use images::jpg_to_pdf;
pub use merge::merge_pdf;
pub use status::{health, status};
pub use upload::read_upload;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, StatusCode, header},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::error;

use crate::helpers::{RouteResult, route_error};
use crate::state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = state.body_limit();

    Router::new()
        // Tools
        .route("/api/jpg-to-pdf", post(jpg_to_pdf))
        .route("/api/merge-pdf", post(merge_pdf))
        .route("/api/convert", post(convert_word))
        .route("/api/pptx-to-pdf", post(convert_presentation))
        .route("/api/pdf-to-word", post(convert_pdf_to_word))
        // Probes
        .route("/api/status", get(status))
        .route("/api/health", get(health))
        // Middleware
        // Generated files are one-off downloads
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, max-age=0"),
        ))
        .layer(CompressionLayer::new())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Run CPU-bound PDF work off the async runtime.
pub async fn run_blocking<F, T>(f: F) -> RouteResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("PDF task panicked: {}", e);
        route_error(StatusCode::INTERNAL_SERVER_ERROR, "Processing failed")
    })
}

// =============================================================================
// Tests
// =============================================================================
