use async_trait::async_trait;
use tracing::{trace, warn};
use ushort_core::repository::Result;
use ushort_core::{CacheError, Link, LinkCache, ReadRepository, Token};

/// A read-only repository decorator that adds caching.
///
/// Token lookups go through the cache's single-flight loading and fall back
/// to the inner repository whenever the cache itself fails. Only complete
/// links are ever cached, and absence is never remembered.
#[derive(Debug, Clone)]
pub struct CachedRepository<R, C> {
    inner: R,
    cache: C,
}

impl<R: ReadRepository, C: LinkCache> CachedRepository<R, C> {
    pub fn new(inner: R, cache: C) -> Self {
        Self { inner, cache }
    }

    /// Returns a reference to the inner repository.
    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Returns a reference to the cache.
    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Drops a cached entry so the next read goes to the store.
    pub async fn invalidate(&self, token: &Token) -> Result<()> {
        trace!(%token, "invalidating cache entry");
        Ok(self.cache.del(token).await?)
    }
}

#[async_trait]
impl<R: ReadRepository, C: LinkCache> ReadRepository for CachedRepository<R, C> {
    async fn find_by_token(&self, token: &Token) -> Result<Option<Link>> {
        let cached = self
            .cache
            .get_or_compute(token, move |t| {
                let token = t.clone();
                async move {
                    trace!(%token, "cache miss, fetching from inner repository");
                    match self.inner.find_by_token(&token).await {
                        Ok(link) => Ok(link.filter(|link| link.token.is_some())),
                        Err(err) => Err(CacheError::Load(Box::new(err))),
                    }
                }
            })
            .await;

        match cached {
            Ok(link) => Ok(link),
            // Store failures surface as themselves, for the loader and for
            // every caller that waited on it.
            Err(CacheError::Load(err)) => Err(*err),
            Err(err) => {
                warn!(%token, error = %err, "cache failed, falling back to inner repository");
                self.inner.find_by_token(token).await
            }
        }
    }

    async fn find_by_url(&self, original_url: &str) -> Result<Option<Link>> {
        self.inner.find_by_url(original_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use ushort_cache::MokaLinkCache;
    use ushort_core::{LinkId, Repository, StorageError};
    use ushort_storage::InMemoryRepository;

    /// Counts token lookups that reach the store.
    #[derive(Clone, Default)]
    struct CountingRepository {
        inner: InMemoryRepository,
        lookups: Arc<AtomicUsize>,
    }

    impl CountingRepository {
        fn lookups(&self) -> usize {
            self.lookups.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ReadRepository for CountingRepository {
        async fn find_by_token(&self, token: &Token) -> Result<Option<Link>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            self.inner.find_by_token(token).await
        }

        async fn find_by_url(&self, original_url: &str) -> Result<Option<Link>> {
            self.inner.find_by_url(original_url).await
        }
    }

    /// A cache whose backend is down.
    struct BrokenCache;

    #[async_trait]
    impl LinkCache for BrokenCache {
        async fn get_link(&self, _token: &Token) -> ushort_core::cache::Result<Option<Link>> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn set_link(&self, _token: &Token, _link: &Link) -> ushort_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }

        async fn del(&self, _token: &Token) -> ushort_core::cache::Result<()> {
            Err(CacheError::Unavailable("connection refused".into()))
        }
    }

    /// A store that always fails, counting the token lookups it receives.
    #[derive(Clone, Default)]
    struct DownRepository {
        lookups: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ReadRepository for DownRepository {
        async fn find_by_token(&self, _token: &Token) -> Result<Option<Link>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            Err(StorageError::Timeout("statement timeout".into()))
        }

        async fn find_by_url(&self, _original_url: &str) -> Result<Option<Link>> {
            Err(StorageError::Timeout("statement timeout".into()))
        }
    }

    async fn complete_link(repo: &InMemoryRepository, url: &str) -> Token {
        let id = repo.insert(url).await.unwrap();
        let token = Token::encode(id);
        repo.set_token(id, &token).await.unwrap();
        token
    }

    fn cached() -> CachedRepository<CountingRepository, MokaLinkCache> {
        CachedRepository::new(CountingRepository::default(), MokaLinkCache::new())
    }

    #[tokio::test]
    async fn miss_loads_from_inner_and_populates_cache() {
        let cached = cached();
        let token = complete_link(&cached.inner().inner, "https://example.com").await;

        let link = cached.find_by_token(&token).await.unwrap().unwrap();
        assert_eq!(link.original_url, "https://example.com");
        assert_eq!(cached.cache().get_link(&token).await.unwrap(), Some(link));

        cached.find_by_token(&token).await.unwrap().unwrap();
        assert_eq!(cached.inner().lookups(), 1);
    }

    #[tokio::test]
    async fn absence_is_not_cached() {
        let cached = cached();
        let store = cached.inner().inner.clone();
        let token = Token::encode(LinkId::new(1));

        assert!(cached.find_by_token(&token).await.unwrap().is_none());

        // The token becomes visible right after the miss.
        assert_eq!(complete_link(&store, "https://late.example").await, token);
        let link = cached.find_by_token(&token).await.unwrap().unwrap();
        assert_eq!(link.original_url, "https://late.example");
    }

    #[tokio::test]
    async fn concurrent_misses_coalesce_into_one_lookup() {
        let cached = Arc::new(cached());
        let token = complete_link(&cached.inner().inner, "https://hot.example").await;
        let mut handles = vec![];

        for _ in 0..16 {
            let cached = Arc::clone(&cached);
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                cached.find_by_token(&token).await
            }));
        }

        for handle in handles {
            let link = handle.await.unwrap().unwrap().unwrap();
            assert_eq!(link.original_url, "https://hot.example");
        }
        assert_eq!(cached.inner().lookups(), 1);
    }

    #[tokio::test]
    async fn broken_cache_falls_back_to_inner() {
        let store = InMemoryRepository::new();
        let token = complete_link(&store, "https://example.com").await;
        let cached = CachedRepository::new(store, BrokenCache);

        let link = cached.find_by_token(&token).await.unwrap().unwrap();
        assert_eq!(link.original_url, "https://example.com");
    }

    #[tokio::test]
    async fn store_errors_surface_unchanged() {
        let store = DownRepository::default();
        let cached = CachedRepository::new(store.clone(), MokaLinkCache::new());

        let err = cached.find_by_token(&Token::new_unchecked("b")).await.unwrap_err();
        assert!(matches!(err, StorageError::Timeout(_)));
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn coalesced_callers_share_the_store_error() {
        let store = DownRepository::default();
        let cached = Arc::new(CachedRepository::new(store.clone(), MokaLinkCache::new()));
        let token = Token::new_unchecked("b");
        let mut handles = vec![];

        for _ in 0..16 {
            let cached = Arc::clone(&cached);
            let token = token.clone();
            handles.push(tokio::spawn(async move {
                cached.find_by_token(&token).await
            }));
        }

        for handle in handles {
            let err = handle.await.unwrap().unwrap_err();
            assert!(matches!(err, StorageError::Timeout(_)), "got {err:?}");
        }
        // Waiters take the loader's error instead of querying the store again.
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn find_by_url_bypasses_cache() {
        let cached = cached();
        complete_link(&cached.inner().inner, "https://example.com").await;

        let link = cached.find_by_url("https://example.com").await.unwrap();
        assert!(link.is_some());
        assert_eq!(cached.inner().lookups(), 0);
    }

    #[tokio::test]
    async fn invalidate_removes_entry_and_is_idempotent() {
        let cached = cached();
        let token = complete_link(&cached.inner().inner, "https://example.com").await;

        cached.find_by_token(&token).await.unwrap();
        cached.invalidate(&token).await.unwrap();
        assert!(cached.cache().get_link(&token).await.unwrap().is_none());

        cached.invalidate(&token).await.unwrap();
    }
}
