//! Typed API error for HTTP handlers.
//!
//! Converts service errors into JSON responses with proper status codes.
//! Handlers return `Result<Json<T>, ApiError>`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use shirt_tracker_cloud::CloudError;
use shirt_tracker_service::ServiceError;

/// API error with HTTP status code and human-readable message.
///
/// Converts to JSON response: `{"error": "message"}`.
///
/// `Internal` logs the real error server-side and returns a static message
/// to the client.
#[derive(Debug)]
pub enum ApiError {
    /// 400 Bad Request: invalid input from caller.
    BadRequest(String),
    /// 404 Not Found: tab, photo or share token doesn't exist.
    NotFound(String),
    /// 500 Internal Server Error: unexpected failure. Details logged, not exposed.
    Internal(anyhow::Error),
    /// 503 Service Unavailable: cloud not configured or temporarily down.
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error".to_owned())
            },
            Self::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };
        let body = serde_json::json!({"error": message});
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        if err.is_not_found() {
            return Self::NotFound(err.to_string());
        }
        if err.is_transient() {
            tracing::warn!("Cloud unavailable: {}", err);
            return Self::ServiceUnavailable("cloud temporarily unavailable".to_owned());
        }
        match err {
            ServiceError::InvalidInput(msg) => Self::BadRequest(msg),
            ServiceError::Cloud(CloudError::InvalidShareToken(token)) => {
                Self::BadRequest(format!("invalid share token: {token}"))
            },
            ServiceError::NotConfigured(msg) => Self::ServiceUnavailable(msg),
            _ => Self::Internal(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: ServiceError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_service_errors_map_to_status() {
        assert_eq!(status(ServiceError::NotFound("tab x".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(ServiceError::InvalidInput("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(ServiceError::Cloud(CloudError::InvalidShareToken("nope".into()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status(ServiceError::Cloud(CloudError::HttpStatus { code: 503, body: String::new() })),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(status(ServiceError::ReadOnly("shared".into())), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
