//! Multipart upload reading shared by every POST route.

use axum::http::StatusCode;
use axum_extra::extract::Multipart;
use axum_extra::extract::multipart::MultipartError;
use bytes::BytesMut;
use doconvert_core::{InputAsset, ServerConfig};
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::helpers::{RouteError, RouteResult, route_error};

/// Files and plain fields of one multipart request.
#[derive(Debug, Default)]
pub struct Upload {
    /// Files posted under the expected field name, in upload order
    pub files: Vec<InputAsset>,
    /// Non-file fields
    pub fields: HashMap<String, String>,
}

impl Upload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// The single file of a one-file endpoint.
    pub fn into_single(self) -> Option<InputAsset> {
        self.files.into_iter().next()
    }
}

fn multipart_error(e: &MultipartError) -> RouteError {
    route_error(e.status(), e.body_text())
}

/// Read the whole request, keeping files posted as `file_field`.
///
/// Files are read chunk by chunk so an oversized file is refused as soon as
/// it crosses `max_file_size` (413). More than `max_files` files is a 400.
pub async fn read_upload(
    multipart: &mut Multipart,
    file_field: &str,
    limits: &ServerConfig,
) -> RouteResult<Upload> {
    let mut upload = Upload::default();

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        let name = field.name().unwrap_or("").to_string();

        let Some(filename) = field.file_name().map(str::to_string) else {
            let value = field.text().await.map_err(|e| multipart_error(&e))?;
            upload.fields.insert(name, value);
            continue;
        };

        if name != file_field {
            debug!("Ignoring file {} in unexpected field {}", filename, name);
            continue;
        }

        if upload.files.len() >= limits.max_files {
            return Err(route_error(
                StatusCode::BAD_REQUEST,
                format!("Too many files (max {})", limits.max_files),
            ));
        }

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(|e| multipart_error(&e))? {
            if data.len() + chunk.len() > limits.max_file_size {
                warn!("Rejected {}: larger than {} bytes", filename, limits.max_file_size);
                return Err(route_error(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!(
                        "{filename} exceeds the {} MB file size limit",
                        limits.max_file_size / (1024 * 1024)
                    ),
                ));
            }
            data.extend_from_slice(&chunk);
        }

        // Browsers send an empty part when no file was picked
        if filename.is_empty() && data.is_empty() {
            continue;
        }

        debug!("Received {} ({} bytes)", filename, data.len());
        upload.files.push(InputAsset::new(data.freeze(), filename));
    }

    Ok(upload)
}
