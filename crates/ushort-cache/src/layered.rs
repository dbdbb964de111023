use crate::Result;
use async_trait::async_trait;
use std::future::Future;
use tracing::{trace, warn};
use ushort_core::{Link, LinkCache, Token};

/// A two-level cache composing a fast local L1 with a shared L2.
///
/// - **Get**: try L1, then L2; an L2 hit is copied into L1.
/// - **Set**: write-through to both layers.
/// - **Delete**: remove from both layers.
///
/// # Example
///
/// ```rust
/// use ushort_cache::{LayeredCache, MokaLinkCache};
///
/// let l1 = MokaLinkCache::with_capacity(10_000);
/// let l2 = MokaLinkCache::with_capacity(100_000);
/// let cache = LayeredCache::new(l1, l2);
/// ```
#[derive(Debug, Clone)]
pub struct LayeredCache<L1, L2> {
    l1: L1,
    l2: L2,
}

impl<L1, L2> LayeredCache<L1, L2> {
    pub fn new(l1: L1, l2: L2) -> Self {
        Self { l1, l2 }
    }

    pub fn l1(&self) -> &L1 {
        &self.l1
    }

    pub fn l2(&self) -> &L2 {
        &self.l2
    }
}

#[async_trait]
impl<L1, L2> LinkCache for LayeredCache<L1, L2>
where
    L1: LinkCache,
    L2: LinkCache,
{
    async fn get_link(&self, token: &Token) -> Result<Option<Link>> {
        if let Some(link) = self.l1.get_link(token).await? {
            trace!(%token, "layered cache hit in L1");
            return Ok(Some(link));
        }

        let Some(link) = self.l2.get_link(token).await? else {
            return Ok(None);
        };

        trace!(%token, "layered cache hit in L2, backfilling L1");
        if let Err(e) = self.l1.set_link(token, &link).await {
            warn!(%token, error = %e, "failed to backfill L1");
        }
        Ok(Some(link))
    }

    async fn set_link(&self, token: &Token, link: &Link) -> Result<()> {
        self.l1.set_link(token, link).await?;
        self.l2.set_link(token, link).await
    }

    async fn del(&self, token: &Token) -> Result<()> {
        self.l1.del(token).await?;
        self.l2.del(token).await
    }

    /// Chains the layers' own single-flight loading: L1 wraps L2 wraps `fetch`.
    async fn get_or_compute<F, Fut>(&self, token: &Token, fetch: F) -> Result<Option<Link>>
    where
        F: FnOnce(&Token) -> Fut + Send,
        Fut: Future<Output = Result<Option<Link>>> + Send,
    {
        let l2 = &self.l2;
        self.l1
            .get_or_compute(token, move |t| {
                let t = t.clone();
                async move { l2.get_or_compute(&t, fetch).await }
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MokaLinkCache;
    use jiff::Timestamp;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use ushort_core::LinkId;

    fn test_link(id: u64) -> Link {
        let id = LinkId::new(id);
        Link {
            id,
            original_url: format!("https://example{id}.com"),
            token: Some(Token::encode(id)),
            created_at: Timestamp::UNIX_EPOCH,
        }
    }

    fn layered() -> LayeredCache<MokaLinkCache, MokaLinkCache> {
        LayeredCache::new(MokaLinkCache::new(), MokaLinkCache::new())
    }

    #[tokio::test]
    async fn l2_hit_backfills_l1() {
        let cache = layered();
        let link = test_link(7);
        let token = link.expected_token();

        cache.l2().set_link(&token, &link).await.unwrap();
        assert!(cache.l1().get_link(&token).await.unwrap().is_none());

        assert_eq!(cache.get_link(&token).await.unwrap(), Some(link.clone()));
        assert_eq!(cache.l1().get_link(&token).await.unwrap(), Some(link));
    }

    #[tokio::test]
    async fn set_writes_through_and_del_clears_both() {
        let cache = layered();
        let link = test_link(8);
        let token = link.expected_token();

        cache.set_link(&token, &link).await.unwrap();
        assert!(cache.l1().get_link(&token).await.unwrap().is_some());
        assert!(cache.l2().get_link(&token).await.unwrap().is_some());

        cache.del(&token).await.unwrap();
        assert!(cache.l1().get_link(&token).await.unwrap().is_none());
        assert!(cache.l2().get_link(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn get_or_compute_fills_both_layers() {
        let cache = layered();
        let link = test_link(9);
        let token = link.expected_token();
        let fetches = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let fetches = Arc::clone(&fetches);
            let expected = link.clone();
            let got = cache
                .get_or_compute(&token, move |_| async move {
                    fetches.fetch_add(1, Ordering::SeqCst);
                    Ok(Some(expected))
                })
                .await
                .unwrap();
            assert_eq!(got, Some(link.clone()));
        }

        assert_eq!(fetches.load(Ordering::SeqCst), 1);
        assert!(cache.l2().get_link(&token).await.unwrap().is_some());
    }
}
