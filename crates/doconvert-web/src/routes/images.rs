//! Images-to-PDF route.

use axum::{extract::State, response::Response};
use axum_extra::extract::Multipart;
use doconvert_core::{Orientation, PageSize, images_to_pdf};
use std::sync::Arc;
use tracing::{info, warn};

use super::{read_upload, run_blocking};
use crate::helpers::{ResultExt, RouteResult, attachment};
use crate::state::AppState;

/// Assemble the uploaded images into one PDF, one page per image.
///
/// Fields: `files` (repeated), optional `pageSize` (`A4` | `LETTER`) and
/// `orientation` (`portrait` | `landscape` | `auto`). Unrecognized values
/// fall back to the defaults.
pub async fn jpg_to_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    let upload = read_upload(&mut multipart, "files", &state.config.server).await?;

    let page_size = upload.field("pageSize").map(PageSize::from_name).unwrap_or_default();
    let orientation = upload
        .field("orientation")
        .map(Orientation::from_name)
        .unwrap_or_default();
    let files = upload.files;

    info!(
        "Converting {} image(s) to PDF ({}, {})",
        files.len(),
        page_size,
        orientation
    );

    let outcome = run_blocking(move || images_to_pdf(&files, page_size, orientation))
        .await?
        .or_route_error()?;

    for skipped in &outcome.skipped {
        warn!("Skipped {}: {}", skipped.filename, skipped.reason);
    }

    attachment(outcome.pdf, "images.pdf", "application/pdf")
}
