use crate::error::ShortenerError;
use crate::token::Token;
use async_trait::async_trait;
use std::fmt::Display;

type Result<T> = std::result::Result<T, ShortenerError>;

/// What shortening an already stored URL does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShortenPolicy {
    /// Return the token the URL already has.
    #[default]
    Idempotent,
    /// Fail with [`ShortenerError::DuplicateUrl`].
    Strict,
}

impl Display for ShortenPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShortenPolicy::Idempotent => f.write_str("idempotent"),
            ShortenPolicy::Strict => f.write_str("strict"),
        }
    }
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Shortens `original_url` and returns its token.
    async fn shorten(&self, original_url: &str) -> Result<Token>;
}
