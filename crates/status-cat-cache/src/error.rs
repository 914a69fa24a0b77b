//! Error types for the status cat cache

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use status_image_store::{InvalidKey, StoreError};
use std::fmt;
use tracing::error;

/// Failure talking to the upstream image source
#[derive(Debug)]
pub enum UpstreamError {
    /// Transport failure, timeout, or unreadable body
    Http(Box<reqwest::Error>),
    /// Upstream answered with a 5xx (or higher) status
    Status(u16),
    /// Base URL could not be used to build image URLs
    InvalidUrl(String),
}

impl fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamError::Http(err) => write!(f, "Upstream HTTP error: {}", err),
            UpstreamError::Status(code) => write!(f, "Upstream returned status {}", code),
            UpstreamError::InvalidUrl(msg) => write!(f, "Invalid upstream URL: {}", msg),
        }
    }
}

impl std::error::Error for UpstreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UpstreamError::Http(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(err: reqwest::Error) -> Self {
        UpstreamError::Http(Box::new(err))
    }
}

impl From<url::ParseError> for UpstreamError {
    fn from(err: url::ParseError) -> Self {
        UpstreamError::InvalidUrl(err.to_string())
    }
}

/// Request-level error, converted to a plain-text response at the handler boundary
#[derive(Debug)]
pub enum CacheError {
    /// Path segment is not a 3-digit code
    InvalidKey(InvalidKey),
    /// No cache entry, or upstream has no image for the code
    NotFound,
    /// Unusable request body
    BadRequest(String),
    MethodNotAllowed,
    Storage(StoreError),
    Upstream(UpstreamError),
}

impl CacheError {
    pub fn status(&self) -> StatusCode {
        match self {
            CacheError::InvalidKey(_) | CacheError::NotFound => StatusCode::NOT_FOUND,
            CacheError::BadRequest(_) => StatusCode::BAD_REQUEST,
            CacheError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            CacheError::Storage(_) | CacheError::Upstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheError::InvalidKey(err) => write!(f, "{}", err),
            CacheError::NotFound => write!(f, "Image not found"),
            CacheError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            CacheError::MethodNotAllowed => write!(f, "Method not allowed"),
            CacheError::Storage(err) => write!(f, "{}", err),
            CacheError::Upstream(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CacheError::InvalidKey(err) => Some(err),
            CacheError::Storage(err) => Some(err),
            CacheError::Upstream(err) => Some(err),
            _ => None,
        }
    }
}

impl From<InvalidKey> for CacheError {
    fn from(err: InvalidKey) -> Self {
        CacheError::InvalidKey(err)
    }
}

impl From<StoreError> for CacheError {
    fn from(err: StoreError) -> Self {
        CacheError::Storage(err)
    }
}

impl From<UpstreamError> for CacheError {
    fn from(err: UpstreamError) -> Self {
        CacheError::Upstream(err)
    }
}

impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "Internal server error");
        }
        plain_text(status, status.canonical_reason().unwrap_or("Error"))
    }
}

/// Plain-text response whose body is `message` plus a trailing newline
pub fn plain_text(status: StatusCode, message: &str) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain")],
        format!("{}\n", message),
    )
        .into_response()
}

/// Fatal errors while starting the server
#[derive(Debug)]
pub enum StartupError {
    Config(String),
    Storage(StoreError),
    Io(Box<std::io::Error>),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Config(msg) => write!(f, "Configuration error: {}", msg),
            StartupError::Storage(err) => write!(f, "Cannot create cache directory: {}", err),
            StartupError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::Storage(err) => Some(err),
            StartupError::Io(err) => Some(err.as_ref()),
            StartupError::Config(_) => None,
        }
    }
}

impl From<StoreError> for StartupError {
    fn from(err: StoreError) -> Self {
        StartupError::Storage(err)
    }
}

impl From<UpstreamError> for StartupError {
    fn from(err: UpstreamError) -> Self {
        StartupError::Config(err.to_string())
    }
}

impl From<std::io::Error> for StartupError {
    fn from(err: std::io::Error) -> Self {
        StartupError::Io(Box::new(err))
    }
}

impl From<tracing_subscriber::filter::ParseError> for StartupError {
    fn from(err: tracing_subscriber::filter::ParseError) -> Self {
        StartupError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use status_image_store::StatusKey;

    async fn body_text(response: Response) -> String {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(body.to_vec()).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        let invalid = StatusKey::parse("abc").unwrap_err();
        assert_eq!(CacheError::from(invalid).status(), StatusCode::NOT_FOUND);
        assert_eq!(CacheError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            CacheError::BadRequest("empty body".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CacheError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
        assert_eq!(
            CacheError::Upstream(UpstreamError::Status(503)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_upstream_error_display() {
        let err = UpstreamError::Status(502);
        assert_eq!(format!("{}", err), "Upstream returned status 502");
    }

    #[test]
    fn test_startup_error_display() {
        let err = StartupError::Config("missing --cache".to_string());
        assert_eq!(format!("{}", err), "Configuration error: missing --cache");
    }

    #[tokio::test]
    async fn test_method_not_allowed_response() {
        let response = CacheError::MethodNotAllowed.into_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain"
        );
        assert_eq!(body_text(response).await, "Method Not Allowed\n");
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = CacheError::Upstream(UpstreamError::Status(500)).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "Internal Server Error\n");
    }

    #[tokio::test]
    async fn test_bad_request_response() {
        let response = CacheError::BadRequest("empty body".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_text(response).await, "Bad Request\n");
    }
}
