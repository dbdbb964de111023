use crate::error::CacheError;
use crate::link::Link;
use crate::token::Token;
use async_trait::async_trait;
use std::future::Future;

pub type Result<T> = std::result::Result<T, CacheError>;

/// A cache of complete links keyed by token.
///
/// Tokens never change once set, so a cached link never goes stale. A miss
/// must not be remembered: a token can become visible right after a lookup.
#[async_trait]
pub trait LinkCache: Send + Sync + 'static {
    /// Get a link from cache.
    ///
    /// Returns `Ok(None)` if the token is not in the cache.
    async fn get_link(&self, token: &Token) -> Result<Option<Link>>;

    /// Store a link in cache.
    async fn set_link(&self, token: &Token, link: &Link) -> Result<()>;

    /// Remove a link from cache.
    ///
    /// It is not an error if the token is not cached.
    async fn del(&self, token: &Token) -> Result<()>;

    /// Get a link from cache, loading it with `fetch` if not present.
    async fn get_or_compute<F, Fut>(&self, token: &Token, fetch: F) -> Result<Option<Link>>
    where
        F: FnOnce(&Token) -> Fut + Send,
        Fut: Future<Output = Result<Option<Link>>> + Send,
    {
        match self.get_link(token).await? {
            Some(link) => Ok(Some(link)),
            None => {
                let link = fetch(token).await?;
                if let Some(ref value) = link {
                    self.set_link(token, value).await?;
                }
                Ok(link)
            }
        }
    }
}
