use crate::lifecycle::LifecycleError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrellisError>;

/// Type-erased error produced by handlers and middleware at request time.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum TrellisError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Duplicate component '{name}': {count} definitions, {overrides} marked override")]
    DuplicateComponent {
        name: String,
        count: usize,
        overrides: usize,
    },

    #[error("Invalid descriptor for '{name}': {message}")]
    InvalidDescriptor { name: String, message: String },

    #[error("Invalid schedule '{cron}': {reason}")]
    Schedule { cron: String, reason: String },

    #[error("Class {type_name} must implement '{operation}' to be used as {role}")]
    MissingHandler {
        type_name: String,
        operation: String,
        role: String,
    },

    #[error("Invalid route path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Controller '{controller}' has no operation '{operation}'")]
    UnknownOperation {
        controller: String,
        operation: String,
    },

    #[error("Route {method} {path} is already registered")]
    RouteConflict { method: String, path: String },

    #[error("Dependency not found: {name}")]
    DependencyNotFound { name: String },

    #[error("Failed to downcast '{name}' to {type_name}")]
    DowncastFailed { name: String, type_name: String },

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error("Transport error: {0}")]
    Transport(String),
}

impl TrellisError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn schedule(cron: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schedule {
            cron: cron.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error aborts the whole startup sequence.
    ///
    /// Schedule errors only remove the offending component.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TrellisError::Schedule { .. })
    }
}

impl From<std::io::Error> for TrellisError {
    fn from(err: std::io::Error) -> Self {
        TrellisError::Transport(err.to_string())
    }
}

impl axum::response::IntoResponse for TrellisError {
    fn into_response(self) -> axum::response::Response {
        (
            axum::http::StatusCode::INTERNAL_SERVER_ERROR,
            self.to_string(),
        )
            .into_response()
    }
}
