use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info};
use url::Url;
use ushort_core::{
    Link, LinkId, Repository, ShortenPolicy, Shortener, ShortenerError, StorageError, Token,
};

/// A concrete implementation of the [`Shortener`] trait.
///
/// Tokens are never generated independently of the store: each one is the
/// base62 encoding of the id the store assigned, so no collision retry is
/// ever performed.
#[derive(Debug, Clone)]
pub struct ShortenerService<R> {
    pub(crate) repository: Arc<R>,
    policy: ShortenPolicy,
}

impl<R: Repository> ShortenerService<R> {
    /// Creates a service with the idempotent policy.
    pub fn new(repository: R) -> Self {
        Self::with_policy(repository, ShortenPolicy::default())
    }

    pub fn with_policy(repository: R, policy: ShortenPolicy) -> Self {
        Self {
            repository: Arc::new(repository),
            policy,
        }
    }

    pub fn policy(&self) -> ShortenPolicy {
        self.policy
    }

    /// Validates that the URL is absolute with an http(s) scheme and a host.
    fn validate_url(url: &str) -> Result<(), ShortenerError> {
        if url.trim().is_empty() {
            return Err(ShortenerError::InvalidUrl(
                "URL cannot be empty".to_string(),
            ));
        }

        // Stored and served as `Location` verbatim.
        if url != url.trim() || url.chars().any(|c| c.is_ascii_control()) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL contains whitespace or control characters: {url:?}"
            )));
        }

        let parsed = Url::parse(url)
            .map_err(|e| ShortenerError::InvalidUrl(format!("{url}: {e}")))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL scheme must be http or https: {}",
                parsed.scheme()
            )));
        }

        if parsed.host_str().is_none_or(str::is_empty) {
            return Err(ShortenerError::InvalidUrl(format!(
                "URL must have a host: {url}"
            )));
        }

        Ok(())
    }

    /// Sets `Token::encode(id)` on the link and returns it.
    pub(crate) async fn assign_token(&self, id: LinkId) -> Result<Token, ShortenerError> {
        let token = Token::encode(id);

        match self.repository.set_token(id, &token).await {
            Ok(()) => Ok(token),
            Err(err) => {
                let err = ShortenerError::from(err);
                if matches!(err, ShortenerError::Inconsistent(_)) {
                    error!(%id, %token, error = %err, "failed to assign derived token");
                }
                Err(err)
            }
        }
    }

    /// Returns the token of an existing link, finishing it first if it was orphaned.
    async fn complete(&self, link: Link) -> Result<Token, ShortenerError> {
        match link.token {
            Some(token) => Ok(token),
            None => {
                info!(id = %link.id, "completing link left without a token");
                self.assign_token(link.id).await
            }
        }
    }

    async fn find_existing(&self, original_url: &str) -> Result<Option<Link>, ShortenerError> {
        Ok(self.repository.find_by_url(original_url).await?)
    }
}

#[async_trait]
impl<R: Repository> Shortener for ShortenerService<R> {
    async fn shorten(&self, original_url: &str) -> Result<Token, ShortenerError> {
        Self::validate_url(original_url)?;

        if self.policy == ShortenPolicy::Idempotent {
            if let Some(link) = self.find_existing(original_url).await? {
                debug!(id = %link.id, "url already shortened");
                return self.complete(link).await;
            }
        }

        let id = match self.repository.insert(original_url).await {
            Ok(id) => id,
            Err(StorageError::DuplicateUrl(_)) if self.policy == ShortenPolicy::Idempotent => {
                // Lost an insert race: the winner's link is the answer.
                debug!("concurrent insert won, resolving existing link");
                let link = self.find_existing(original_url).await?.ok_or_else(|| {
                    ShortenerError::Inconsistent(format!(
                        "store reported {original_url} as duplicate but has no such link"
                    ))
                })?;
                return self.complete(link).await;
            }
            Err(err) => return Err(err.into()),
        };

        let token = self.assign_token(id).await?;
        info!(%id, %token, "shortened url");
        Ok(token)
    }
}
