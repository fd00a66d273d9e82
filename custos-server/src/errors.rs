use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use custos_core::{ApiResponse, CoreError};
use serde_json::Value;
use std::fmt;

pub type AppResult<T> = Result<T, AppError>;

/// HTTP-facing error: a status code plus the `error` value rendered into the
/// uniform response envelope (a message string, or a per-field map for
/// validation failures).
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub error: Value,
}

impl AppError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            error: Value::String(message.into()),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error {
            Value::String(message) => write!(f, "{message}"),
            other => write!(f, "{other}"),
        }
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.error))).into_response()
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCredential => Self::unauthorized("invalid credential"),
            CoreError::NotFound(message) => Self::not_found(message),
            CoreError::Conflict(message) => Self::unprocessable(message),
            CoreError::Validation(fields) => Self {
                status: StatusCode::BAD_REQUEST,
                error: serde_json::to_value(fields)
                    .unwrap_or_else(|_| Value::String("validation failed".to_string())),
            },
            CoreError::Unavailable(message) => Self::new(StatusCode::SERVICE_UNAVAILABLE, message),
            CoreError::Serialization(err) => Self::internal(err.to_string()),
            CoreError::Internal(message) => Self::internal(message),
        }
    }
}
