//! Helper types and traits for cleaner route handlers.
//!
//! Every error leaves the server as a JSON body `{"error": "<message>"}`.
//! The extension traits here turn core results into that shape with the
//! right status code.

use axum::{
    Json,
    body::Body,
    http::{StatusCode, header},
    response::Response,
};
use doconvert_core::Error;
use serde::Serialize;
use tracing::error;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Error half of a route result.
pub type RouteError = (StatusCode, Json<ErrorBody>);

/// Standard result type for route handlers.
pub type RouteResult<T> = Result<T, RouteError>;

/// Build a route error with the given status and message.
pub fn route_error(status: StatusCode, msg: impl Into<String>) -> RouteError {
    (status, Json(ErrorBody { error: msg.into() }))
}

/// HTTP status for a core error.
pub const fn status_for(err: &Error) -> StatusCode {
    if err.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    }
}

/// Extension trait for converting core results to `RouteResult<T>`.
pub trait ResultExt<T> {
    /// Maps the error to 400 or 500 depending on whose fault it is.
    fn or_route_error(self) -> RouteResult<T>;
}

impl<T> ResultExt<T> for doconvert_core::Result<T> {
    fn or_route_error(self) -> RouteResult<T> {
        self.map_err(|e| {
            let status = status_for(&e);
            if status.is_server_error() {
                error!("{}", e);
            }
            route_error(status, e.to_string())
        })
    }
}

/// Extension trait for converting `Option<T>` to `RouteResult<T>`.
pub trait OptionExt<T> {
    /// Returns the contained value or a 400 Bad Request error.
    fn or_bad_request(self, msg: &str) -> RouteResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_bad_request(self, msg: &str) -> RouteResult<T> {
        self.ok_or_else(|| route_error(StatusCode::BAD_REQUEST, msg))
    }
}

/// Quoted-string safe fallback for the plain `filename` parameter.
fn ascii_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c == ' ' || (c.is_ascii_graphic() && c != '"' && c != '\\') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `Content-Disposition` value for a download named `filename`.
pub fn content_disposition(filename: &str) -> String {
    let fallback = ascii_filename(filename);
    if fallback == filename {
        format!("attachment; filename=\"{filename}\"")
    } else {
        format!(
            "attachment; filename=\"{fallback}\"; filename*=UTF-8''{}",
            urlencoding::encode(filename)
        )
    }
}

/// A file download response.
pub fn attachment(
    bytes: impl Into<Body>,
    filename: &str,
    content_type: &str,
) -> RouteResult<Response> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_DISPOSITION, content_disposition(filename))
        .body(bytes.into())
        .map_err(|e| route_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_names_are_quoted() {
        assert_eq!(
            content_disposition("merged.pdf"),
            "attachment; filename=\"merged.pdf\""
        );
        assert_eq!(
            content_disposition("my report.pdf"),
            "attachment; filename=\"my report.pdf\""
        );
    }

    #[test]
    fn test_unicode_names_get_extended_parameter() {
        let value = content_disposition("résumé.pdf");
        assert!(value.starts_with("attachment; filename=\"r_sum_.pdf\""));
        assert!(value.ends_with("filename*=UTF-8''r%C3%A9sum%C3%A9.pdf"));
    }

    #[test]
    fn test_quotes_are_not_passed_through() {
        let value = content_disposition("a\"b.pdf");
        assert!(value.starts_with("attachment; filename=\"a_b.pdf\""));
    }

    #[test]
    fn test_status_for_core_errors() {
        assert_eq!(
            status_for(&Error::InvalidInput("x".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&Error::EmptyOutput),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&Error::CollaboratorFailure("down".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
