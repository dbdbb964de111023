use crate::error::StorageError;
use crate::link::{Link, LinkId};
use crate::token::Token;
use async_trait::async_trait;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// A read-only view of the link store.
///
/// This trait provides only the lookup operations from [`Repository`],
/// allowing the redirector to hold read-only access.
#[async_trait]
pub trait ReadRepository: Send + Sync + 'static {
    /// Finds the link holding exactly `token` (case-sensitive).
    /// Returns `None` if no link has that token.
    async fn find_by_token(&self, token: &Token) -> Result<Option<Link>>;

    /// Finds the link created for `original_url`, whether or not its token is set.
    async fn find_by_url(&self, original_url: &str) -> Result<Option<Link>>;
}

/// The link store of record.
///
/// Uniqueness of both the original URL and the token is enforced by the
/// store itself, never by a read-then-write check in the caller.
#[async_trait]
pub trait Repository: ReadRepository {
    /// Inserts a link without a token and returns its freshly assigned id.
    ///
    /// Returns `Err(DuplicateUrl)` if the URL is already stored.
    async fn insert(&self, original_url: &str) -> Result<LinkId>;

    /// Assigns `token` to the link `id`.
    ///
    /// Setting the same token twice is a no-op. Returns `Err(DuplicateToken)`
    /// if another link holds the token, `Err(TokenImmutable)` if this link
    /// already holds a different one, and `Err(NotFound)` for an unknown id.
    async fn set_token(&self, id: LinkId, token: &Token) -> Result<()>;

    /// Returns up to `limit` links still waiting for a token with an id
    /// greater than `after`, oldest first.
    async fn find_tokenless(&self, after: Option<LinkId>, limit: usize) -> Result<Vec<Link>>;

    /// Returns up to `limit` links with an id greater than `after`, in id order.
    async fn links_after(&self, after: Option<LinkId>, limit: usize) -> Result<Vec<Link>>;
}
