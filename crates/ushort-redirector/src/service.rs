use std::sync::Arc;

use crate::redirector::Redirector;
use crate::{RedirectorError, Result};
use async_trait::async_trait;
use tracing::{debug, trace};
use ushort_core::{ReadRepository, Token};

/// Service for resolving tokens to their original URLs.
///
/// Tokens are validated against the base62 alphabet before any store lookup.
#[derive(Debug, Clone)]
pub struct RedirectorService<R> {
    repository: Arc<R>,
}

impl<R: ReadRepository> RedirectorService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }
}

#[async_trait]
impl<R: ReadRepository> Redirector for RedirectorService<R> {
    async fn resolve(&self, token: &str) -> Result<String> {
        let token = Token::parse(token)?;
        trace!(%token, "resolving token");

        match self.repository.find_by_token(&token).await? {
            Some(link) => {
                debug!(%token, url = %link.original_url, "resolved token");
                Ok(link.original_url)
            }
            None => {
                trace!(%token, "token not found");
                Err(RedirectorError::NotFound(token.to_string()))
            }
        }
    }
}
