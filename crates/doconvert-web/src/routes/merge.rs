//! PDF merge route.

use axum::{extract::State, response::Response};
use axum_extra::extract::Multipart;
use doconvert_core::merge_uploaded_pdfs;
use std::sync::Arc;
use tracing::info;

use super::{read_upload, run_blocking};
use crate::helpers::{ResultExt, RouteResult, attachment};
use crate::state::AppState;

/// Merge the uploaded PDFs, in upload order, into `merged.pdf`.
pub async fn merge_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let files = read_upload(&mut multipart, "files", &state.config.server)
        .await?
        .files;

    info!("Merging {} uploaded PDF(s)", files.len());

    let outcome = run_blocking(move || merge_uploaded_pdfs(&files)).await?.or_route_error()?;

    attachment(outcome.pdf, "merged.pdf", "application/pdf")
}
