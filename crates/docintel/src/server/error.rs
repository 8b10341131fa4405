use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::intake::IntakeError;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    #[serde(rename = "type")]
    kind: &'static str,
    message: String,
}

/// Errors returned by handlers, rendered as `{"error": {"type", "message"}}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl From<IntakeError> for ApiError {
    fn from(err: IntakeError) -> Self {
        match err {
            IntakeError::NotFound(_) => ApiError::NotFound(err.to_string()),
            IntakeError::UnsupportedType { .. }
            | IntakeError::TooLarge { .. }
            | IntakeError::InvalidFilename(_)
            | IntakeError::NoFiles
            | IntakeError::TooManyFiles { .. }
            | IntakeError::InFlight { .. } => ApiError::BadRequest(err.to_string()),
            IntakeError::Storage(_) | IntakeError::Database(_) => {
                ApiError::Internal(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "bad_request", message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { kind, message },
        };
        (status, Json(body)).into_response()
    }
}
