use crate::error::BoxError;
use axum::http::StatusCode;
use axum::response::Response;
use std::fmt;

pub mod http;

pub use http::HttpExceptionFilter;

/// Handles errors returned by middleware and route handlers.
///
/// Installed on the transport during the error-handling step of startup.
/// Filters must always produce a response.
pub trait ExceptionFilter: Send + Sync + 'static {
    fn catch(&self, error: BoxError) -> Response;
}

/// An error carrying the HTTP status it should be reported with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpException {
    pub status: StatusCode,
    pub message: String,
}

impl HttpException {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl fmt::Display for HttpException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for HttpException {}
