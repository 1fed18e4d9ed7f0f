//! API-layer error envelope: maps every [`cardforge_core::CardforgeError`]
//! onto one of the seven request-facing kinds and an HTTP status, producing
//! the success/error JSON envelope shapes the chat and deck endpoints share.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use cardforge_core::{CardforgeError, ErrorKind};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    InvalidInput,
    NotFound,
    UpstreamUnavailable,
    ParseFailure,
    InvariantViolation,
    Timeout,
    Internal,
}

impl ErrorCode {
    pub fn status_code(self) -> StatusCode {
        match self {
            ErrorCode::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::UpstreamUnavailable => StatusCode::OK,
            ErrorCode::ParseFailure => StatusCode::OK,
            ErrorCode::InvariantViolation => StatusCode::OK,
            ErrorCode::Timeout => StatusCode::OK,
            ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ErrorKind> for ErrorCode {
    fn from(kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::InvalidInput => ErrorCode::InvalidInput,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::UpstreamUnavailable => ErrorCode::UpstreamUnavailable,
            ErrorKind::ParseFailure => ErrorCode::ParseFailure,
            ErrorKind::InvariantViolation => ErrorCode::InvariantViolation,
            ErrorKind::Timeout => ErrorCode::Timeout,
            ErrorKind::Internal => ErrorCode::Internal,
        }
    }
}

/// Error envelope returned by every non-2xx-controlled-failure response:
/// `{"success": false, "error": "<code>", "message": "<human text>"}`.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(error: ErrorCode, message: impl Into<String>) -> Self {
        Self { success: false, error, message: message.into() }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, message)
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

impl From<CardforgeError> for ApiError {
    fn from(err: CardforgeError) -> Self {
        let kind = err.kind();
        if kind == ErrorKind::Internal {
            tracing::error!(error = %err, "uncaught internal error");
        }
        Self::new(kind.into(), err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cardforge_core::{CoreError, LlmError, StorageError};

    #[test]
    fn not_found_storage_error_maps_to_404() {
        let err: CardforgeError = StorageError::DeckNotFound("abc".to_string()).into();
        let api_err: ApiError = err.into();
        assert_eq!(api_err.error, ErrorCode::NotFound);
        assert_eq!(api_err.error.status_code(), StatusCode::NOT_FOUND);
        assert!(!api_err.success);
    }

    #[test]
    fn invariant_violation_keeps_status_200() {
        let err: CardforgeError = CoreError::DeckSizeMismatch { expected: 60, actual: 58 }.into();
        let api_err: ApiError = err.into();
        assert_eq!(api_err.error, ErrorCode::InvariantViolation);
        assert_eq!(api_err.error.status_code(), StatusCode::OK);
    }

    #[test]
    fn upstream_unavailable_keeps_status_200() {
        let err: CardforgeError = LlmError::TimedOut { provider: "openai".to_string(), elapsed_ms: 1200 }.into();
        let api_err: ApiError = err.into();
        assert_eq!(api_err.error, ErrorCode::Timeout);
        assert_eq!(api_err.error.status_code(), StatusCode::OK);
    }

    #[test]
    fn internal_maps_to_500() {
        let api_err = ApiError::internal("boom");
        assert_eq!(api_err.error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
