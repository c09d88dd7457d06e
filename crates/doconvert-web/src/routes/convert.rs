//! Office conversion routes.
//!
//! These relay the upload to the configured converter and send back what it
//! produced. Nothing is stored.

use axum::{extract::State, http::StatusCode, response::Response};
use axum_extra::extract::Multipart;
use doconvert_core::{AssetKind, ConversionTarget};
use std::sync::Arc;
use tracing::info;

use super::read_upload;
use crate::helpers::{OptionExt, ResultExt, RouteResult, attachment, route_error};
use crate::state::AppState;

async fn relay(
    state: &AppState,
    multipart: &mut Multipart,
    source: AssetKind,
    target: ConversionTarget,
) -> RouteResult<Response> {
    let asset = read_upload(multipart, "file", &state.config.server)
        .await?
        .into_single()
        .or_bad_request("No file uploaded")?;

    if asset.kind != source {
        return Err(route_error(
            StatusCode::BAD_REQUEST,
            format!(
                "{} is a {}, expected a {}",
                asset.filename,
                asset.kind.label(),
                source.label()
            ),
        ));
    }

    info!(
        "Converting {} to {} with {}",
        asset.filename,
        target.extension(),
        state.converter.name()
    );

    let converted = state.converter.convert(&asset, target).await.or_route_error()?;
    attachment(converted.bytes, &converted.filename, converted.content_type)
}

/// Word document to PDF.
pub async fn convert_word(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    relay(&state, &mut multipart, AssetKind::Word, ConversionTarget::Pdf).await
}

/// Presentation to PDF.
pub async fn convert_presentation(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    relay(&state, &mut multipart, AssetKind::Presentation, ConversionTarget::Pdf).await
}

/// PDF to Word document.
pub async fn convert_pdf_to_word(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> RouteResult<Response> {
    relay(&state, &mut multipart, AssetKind::Pdf, ConversionTarget::Docx).await
}
