use thiserror::Error;
use ushort_core::{CoreError, StorageError};

#[derive(Debug, Error)]
pub enum RedirectorError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("token not found: {0}")]
    NotFound(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<CoreError> for RedirectorError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::InvalidToken(token) => Self::InvalidToken(token),
        }
    }
}

impl From<StorageError> for RedirectorError {
    fn from(value: StorageError) -> Self {
        if value.is_transient() {
            Self::Unavailable(value.to_string())
        } else {
            Self::Storage(value.to_string())
        }
    }
}
