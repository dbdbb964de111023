use crate::Result;
use async_trait::async_trait;
use moka::future::Cache;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};
use typed_builder::TypedBuilder;
use ushort_core::{CacheError, Link, LinkCache, Token};

const DEFAULT_CAPACITY: u64 = 10_000;

/// Outcome of a single-flight load that must not be cached.
enum Miss {
    Absent,
    Failed(CacheError),
}

/// Process-local [`LinkCache`] backed by a Moka future cache.
///
/// Suited to single-node deployments or as the L1 in front of Redis.
#[derive(Debug, Clone)]
pub struct MokaLinkCache {
    cache: Cache<Token, Link>,
}

impl MokaLinkCache {
    /// Creates a cache holding at most 10,000 links.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates a cache with a custom maximum capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        let cache = Cache::builder().max_capacity(max_capacity).build();
        Self { cache }
    }

    /// Creates a cache whose entries expire `ttl` after insertion.
    pub fn with_ttl(max_capacity: u64, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(ttl)
            .build();
        Self { cache }
    }

    /// Starts a [`MokaCacheConfig`] with capacity, TTL and TTI knobs.
    pub fn builder() -> MokaCacheConfigBuilder {
        MokaCacheConfig::builder()
    }
}

impl Default for MokaLinkCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkCache for MokaLinkCache {
    async fn get_link(&self, token: &Token) -> Result<Option<Link>> {
        let link = self.cache.get(token).await;
        match link {
            Some(_) => trace!(%token, "cache hit in moka"),
            None => trace!(%token, "cache miss in moka"),
        }
        Ok(link)
    }

    async fn set_link(&self, token: &Token, link: &Link) -> Result<()> {
        self.cache.insert(token.clone(), link.clone()).await;
        trace!(%token, "cached link in moka");
        Ok(())
    }

    async fn del(&self, token: &Token) -> Result<()> {
        self.cache.invalidate(token).await;
        trace!(%token, "removed link from moka (if present)");
        Ok(())
    }

    async fn get_or_compute<F, Fut>(&self, token: &Token, fetch: F) -> Result<Option<Link>>
    where
        F: FnOnce(&Token) -> Fut + Send,
        Fut: Future<Output = Result<Option<Link>>> + Send,
    {
        // try_get_with coalesces concurrent loads of the same key and never
        // caches an Err, which is how absence stays out of the cache.
        let loaded = self
            .cache
            .try_get_with(token.clone(), async {
                trace!(%token, "cache miss, performing single-flight fetch");
                match fetch(token).await {
                    Ok(Some(link)) => Ok(link),
                    Ok(None) => Err(Miss::Absent),
                    Err(err) => Err(Miss::Failed(err)),
                }
            })
            .await;

        match loaded {
            Ok(link) => Ok(Some(link)),
            Err(miss) => match miss.as_ref() {
                Miss::Absent => {
                    debug!(%token, "token absent from backing store");
                    Ok(None)
                }
                Miss::Failed(err) => Err(err.clone()),
            },
        }
    }
}

/// Configuration for creating a [`MokaLinkCache`] with custom settings.
#[derive(Debug, TypedBuilder, Default)]
pub struct MokaCacheConfig {
    /// Maximum number of entries the cache can hold.
    #[builder(default, setter(strip_option))]
    max_capacity: Option<u64>,
    /// Time-to-live for cache entries.
    #[builder(default, setter(strip_option))]
    ttl: Option<Duration>,
    /// Time-to-idle for cache entries.
    #[builder(default, setter(strip_option))]
    tti: Option<Duration>,
}

impl From<MokaCacheConfig> for MokaLinkCache {
    fn from(config: MokaCacheConfig) -> Self {
        let mut builder = Cache::builder().max_capacity(config.max_capacity.unwrap_or(DEFAULT_CAPACITY));

        if let Some(ttl) = config.ttl {
            builder = builder.time_to_live(ttl);
        }

        if let Some(tti) = config.tti {
            builder = builder.time_to_idle(tti);
        }

        MokaLinkCache {
            cache: builder.build(),
        }
    }
}
