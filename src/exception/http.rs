use crate::error::{BoxError, TrellisError};
use crate::exception::{ExceptionFilter, HttpException};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Default filter: JSON body with status code, message and timestamp.
#[derive(Debug, Default)]
pub struct HttpExceptionFilter;

impl ExceptionFilter for HttpExceptionFilter {
    fn catch(&self, error: BoxError) -> Response {
        let (status, message) = if let Some(exception) = error.downcast_ref::<HttpException>() {
            (exception.status, exception.message.clone())
        } else if let Some(trellis_error) = error.downcast_ref::<TrellisError>() {
            (StatusCode::INTERNAL_SERVER_ERROR, trellis_error.to_string())
        } else {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal Server Error".to_string(),
            )
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", error);
        } else {
            tracing::debug!("Request rejected: {}", error);
        }

        (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_http_exception_keeps_status() {
        let response = HttpExceptionFilter.catch(Box::new(HttpException::not_found("no user")));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body(response).await;
        assert_eq!(body["statusCode"], 404);
        assert_eq!(body["message"], "no user");
        assert!(body["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_errors_are_opaque() {
        let error: BoxError = "database password leaked".into();
        let response = HttpExceptionFilter.catch(error);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body(response).await["message"], "Internal Server Error");
    }
}
