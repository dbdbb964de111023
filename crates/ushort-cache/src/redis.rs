use crate::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;
use tracing::{debug, trace, warn};
use ushort_core::{CacheError, Link, LinkCache, Token};

const DEFAULT_KEY_PREFIX: &str = "ushort:link:";

/// A Redis-based implementation of [`LinkCache`].
///
/// Links are stored as JSON strings under a configurable key prefix.
#[derive(Clone)]
pub struct RedisLinkCache {
    conn: ConnectionManager,
    key_prefix: String,
    ttl: Option<Duration>,
}

impl RedisLinkCache {
    /// Creates a cache over an established connection manager.
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl: None,
        }
    }

    /// Opens a connection manager to `redis_url` and wraps it.
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| CacheError::Unavailable(format!("invalid redis url: {e}")))?;
        let conn = ConnectionManager::new(client).await.map_err(map_redis_error)?;
        debug!("connected to redis");
        Ok(Self::new(conn))
    }

    /// Uses a custom prefix for cache keys (e.g. `"myapp:link:"`).
    pub fn with_prefix(mut self, key_prefix: impl Into<String>) -> Self {
        self.key_prefix = key_prefix.into();
        self
    }

    /// Expires entries `ttl` after they are written.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    fn cache_key(&self, token: &Token) -> String {
        format!("{}{}", self.key_prefix, token.as_str())
    }
}

impl std::fmt::Debug for RedisLinkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLinkCache")
            .field("key_prefix", &self.key_prefix)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

fn map_redis_error(err: redis::RedisError) -> CacheError {
    let message = err.to_string();
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

#[async_trait]
impl LinkCache for RedisLinkCache {
    async fn get_link(&self, token: &Token) -> Result<Option<Link>> {
        let key = self.cache_key(token);
        trace!(%token, "fetching link from redis");

        let mut conn = self.conn.clone();
        let cached: Option<String> = conn.get(&key).await.map_err(|e| {
            warn!(%token, error = %e, "redis error on get");
            map_redis_error(e)
        })?;

        let Some(cached) = cached else {
            trace!(%token, "cache miss in redis");
            return Ok(None);
        };

        match serde_json::from_str::<Link>(&cached) {
            Ok(link) => {
                trace!(%token, "cache hit in redis");
                Ok(Some(link))
            }
            Err(e) => {
                warn!(%token, error = %e, "failed to deserialize cached link");
                Ok(None)
            }
        }
    }

    async fn set_link(&self, token: &Token, link: &Link) -> Result<()> {
        let key = self.cache_key(token);
        let json =
            serde_json::to_string(link).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self.conn.clone();
        let result = match self.ttl {
            Some(ttl) => conn.set_ex::<_, _, ()>(&key, json, ttl.as_secs().max(1)).await,
            None => conn.set::<_, _, ()>(&key, json).await,
        };

        result.map_err(|e| {
            warn!(%token, error = %e, "failed to cache link in redis");
            map_redis_error(e)
        })?;
        trace!(%token, "cached link in redis");
        Ok(())
    }

    async fn del(&self, token: &Token) -> Result<()> {
        let key = self.cache_key(token);

        let mut conn = self.conn.clone();
        conn.del::<_, ()>(&key).await.map_err(|e| {
            warn!(%token, error = %e, "failed to remove link from redis");
            map_redis_error(e)
        })?;
        trace!(%token, "removed link from redis");
        Ok(())
    }
}
