use crate::link::LinkId;
use thiserror::Error;

/// Errors related to the core functionality of the URL shortener service.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache serialization failed: {0}")]
    Serialization(String),
    #[error("cache value is invalid: {0}")]
    InvalidData(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
    /// The backing store failed while the cache was loading a miss. Every
    /// caller coalesced onto that load receives it.
    #[error("loading link from store failed: {0}")]
    Load(Box<StorageError>),
}

/// Errors reported by a link store.
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    #[error("url already shortened: {0}")]
    DuplicateUrl(String),
    #[error("token already assigned: {0}")]
    DuplicateToken(String),
    #[error("link not found: {0}")]
    NotFound(LinkId),
    #[error("link {0} already holds a different token")]
    TokenImmutable(LinkId),
    #[error("storage backend unavailable: {0}")]
    Unavailable(String),
    #[error("storage operation timed out: {0}")]
    Timeout(String),
    #[error("storage query failed: {0}")]
    Query(String),
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}

impl StorageError {
    /// Whether the failure is an infrastructure fault worth retrying with backoff.
    ///
    /// The outcome of a timed out write is unknown; callers retrying an
    /// insert should go through an idempotent path.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Unavailable(_) | StorageError::Timeout(_))
    }
}

/// Errors surfaced by [`Shortener`](crate::Shortener) implementations.
#[derive(Debug, Clone, Error)]
pub enum ShortenerError {
    #[error("invalid url: {0}")]
    InvalidUrl(String),
    #[error("url already shortened: {0}")]
    DuplicateUrl(String),
    #[error("internal consistency error: {0}")]
    Inconsistent(String),
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ShortenerError {
    /// Only transient storage failures may be retried by the caller.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ShortenerError::Unavailable(_))
    }
}

impl From<StorageError> for ShortenerError {
    fn from(value: StorageError) -> Self {
        match value {
            StorageError::DuplicateUrl(url) => Self::DuplicateUrl(url),
            err @ (StorageError::DuplicateToken(_)
            | StorageError::TokenImmutable(_)
            | StorageError::NotFound(_)) => Self::Inconsistent(err.to_string()),
            err if err.is_transient() => Self::Unavailable(err.to_string()),
            other => Self::Storage(other.to_string()),
        }
    }
}
