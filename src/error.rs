//! Error handling for the scan triage service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation error (bad CIDR, fid, credential list)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Conflict (duplicate)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Scan worker answered with a non-success status
    #[error("Scan worker error ({status}): {message}")]
    Worker { status: u16, message: String },

    /// Worker body that does not decode
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl Error {
    /// HTTP status and machine-readable code for this error
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Error::Worker { .. } => (StatusCode::BAD_GATEWAY, "WORKER_ERROR"),
            Error::Serialization(_) => (StatusCode::BAD_GATEWAY, "SERIALIZATION_ERROR"),
            Error::Http(_) => (StatusCode::BAD_GATEWAY, "HTTP_ERROR"),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status_and_code();
        let message = match &self {
            Error::NotFound(msg) | Error::Validation(msg) | Error::Conflict(msg) => msg.clone(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error_code = %error_code,
                message = %message,
                "Request error"
            );
        } else {
            tracing::warn!(
                status = %status,
                error_code = %error_code,
                message = %message,
                "Request rejected"
            );
        }

        let body = Json(json!({
            "error_code": error_code,
            "message": message
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let resp = Error::Validation("fid must be 4 digits".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_worker_maps_to_bad_gateway() {
        let err = Error::Worker {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Scan worker error (500): boom");
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_undecodable_body_maps_to_bad_gateway() {
        let err: Error = serde_json::from_str::<u32>("not json").unwrap_err().into();
        assert!(matches!(err, Error::Serialization(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_GATEWAY);
    }
}
