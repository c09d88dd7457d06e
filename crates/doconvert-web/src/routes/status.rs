//! Feature availability and liveness routes.

use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::state::AppState;

/// Which tools the front end may offer.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureStatus {
    pub word_enabled: bool,
    pub pptx_enabled: bool,
    pub pdf_word_enabled: bool,
    pub image_pdf_enabled: bool,
    pub merge_pdf_enabled: bool,
}

pub async fn status(State(state): State<Arc<AppState>>) -> Json<FeatureStatus> {
    let office = state.converter.is_available();
    Json(FeatureStatus {
        word_enabled: office,
        pptx_enabled: office,
        pdf_word_enabled: office,
        image_pdf_enabled: true,
        merge_pdf_enabled: true,
    })
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
