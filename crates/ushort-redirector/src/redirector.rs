use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Redirector: Send + Sync + 'static {
    /// Resolves a token to the URL it was created for.
    ///
    /// Only links whose token has been set are resolvable.
    async fn resolve(&self, token: &str) -> Result<String>;
}
