use crate::model::ErrorResponse;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{error, warn};
use ushort_core::ShortenerError;
use ushort_redirector::RedirectorError;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Unavailable(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ShortenerError> for AppError {
    fn from(err: ShortenerError) -> Self {
        match err {
            ShortenerError::InvalidUrl(_) => AppError::BadRequest(err.to_string()),
            ShortenerError::DuplicateUrl(_) => AppError::Conflict(err.to_string()),
            ShortenerError::Unavailable(_) => AppError::Unavailable(err.to_string()),
            ShortenerError::Inconsistent(_) | ShortenerError::Storage(_) => {
                AppError::Internal(err.to_string())
            }
        }
    }
}

impl From<RedirectorError> for AppError {
    fn from(err: RedirectorError) -> Self {
        match err {
            RedirectorError::InvalidToken(_) => AppError::BadRequest(err.to_string()),
            RedirectorError::NotFound(_) => AppError::NotFound(err.to_string()),
            RedirectorError::Unavailable(_) => AppError::Unavailable(err.to_string()),
            RedirectorError::Storage(_) => AppError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            AppError::BadRequest(message)
            | AppError::NotFound(message)
            | AppError::Conflict(message) => message,
            AppError::Unavailable(message) => {
                warn!(error = %message, "backend unavailable");
                message
            }
            AppError::Internal(message) => {
                error!(error = %message, "request failed");
                message
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
