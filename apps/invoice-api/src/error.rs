//! Error types for the Invoice API.
//!
//! Every failure leaves the server as `{ "success": false, "error": "..." }`,
//! with `details` carrying ordered validation messages when there are any.
//! Storage failures are logged here and surfaced with a fixed message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use tally_core::{CoreError, ValidationError};
use tally_db::DbError;

/// An HTTP-facing error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: StatusCode,
    pub message: String,
    pub details: Vec<String>,
}

impl ApiError {
    pub fn new(code: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// 400 listing every failed rule.
    pub fn validation(errors: Vec<String>) -> Self {
        ApiError {
            code: StatusCode::BAD_REQUEST,
            message: "Validation failed".to_string(),
            details: errors,
        }
    }

    /// Maps a storage failure; `NotFound` keeps its 404.
    pub fn storage(err: DbError, context: &str) -> Self {
        if err.is_not_found() {
            return ApiError::not_found("Invoice not found");
        }
        error!(error = %err, context, "Storage failure");
        ApiError::internal(context)
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidDraft(errors) => ApiError::validation(errors),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    details: Vec<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.message,
            details: self.details,
        };
        (self.code, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors() {
        let err: ApiError = CoreError::UnknownStatus("archived".to_string()).into();
        assert_eq!(err.code, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid status: archived");

        let err: ApiError = CoreError::InvalidDraft(vec!["Customer name is required".to_string()]).into();
        assert_eq!(err.details, vec!["Customer name is required"]);
    }

    #[test]
    fn test_storage_errors() {
        let err = ApiError::storage(DbError::not_found("Invoice", "x"), "Failed to fetch invoice");
        assert_eq!(err.code, StatusCode::NOT_FOUND);

        let err = ApiError::storage(DbError::QueryFailed("disk I/O error".to_string()), "Failed to fetch invoice");
        assert_eq!(err.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "Failed to fetch invoice");
    }
}
