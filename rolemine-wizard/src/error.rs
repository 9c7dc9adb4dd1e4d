//! Error types for the wizard HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rolemine_common::{NetworkError, ValidationError};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Field-level validation failure (400)
    #[error("{0}")]
    Validation(ValidationError),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Conflict (409) - wrong step or another operation in flight
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Backend call failed under the `fail` policy (502)
    #[error("{0}")]
    BadGateway(NetworkError),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<rolemine_common::Error> for ApiError {
    fn from(err: rolemine_common::Error) -> Self {
        use rolemine_common::Error;

        match err {
            Error::Validation(v) => ApiError::Validation(v),
            Error::Network(n) => ApiError::BadGateway(n),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            e @ Error::InvalidTransition { .. } => ApiError::Conflict(e.to_string()),
            Error::Busy(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, field) = match self {
            ApiError::Validation(v) => (
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
                v.message,
                Some(v.field),
            ),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg, None),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg, None),
            ApiError::BadGateway(ref err) => (
                StatusCode::BAD_GATEWAY,
                "BACKEND_ERROR",
                err.to_string(),
                None,
            ),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                msg,
                None,
            ),
        };

        let mut error = json!({
            "code": error_code,
            "message": message,
        });
        if let Some(field) = field {
            error["field"] = json!(field);
        }

        (status, Json(json!({ "error": error }))).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rolemine_common::Error;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("files", "bad"), StatusCode::BAD_REQUEST),
            (Error::NotFound("role 9".into()), StatusCode::NOT_FOUND),
            (Error::Busy("mining".into()), StatusCode::CONFLICT),
            (
                Error::InvalidTransition {
                    from: "upload".into(),
                    action: "proceed".into(),
                },
                StatusCode::CONFLICT,
            ),
            (
                Error::Network(NetworkError::Unreachable("refused".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (Error::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let response = ApiError::from(err).into_response();
            assert_eq!(response.status(), expected);
        }
    }
}
