use std::time::Duration;

use jiff::Timestamp;
use ushort_cache::{LayeredCache, LinkCache, MokaLinkCache, RedisLinkCache};
use ushort_core::{Link, LinkId, Token};
use ushort_test_infra::redis::RedisServer;

/// Test fixture that manages a Redis container using test-infra.
struct RedisTestContainer {
    _redis: RedisServer,
    redis_url: String,
}

impl RedisTestContainer {
    async fn start() -> Self {
        let redis = RedisServer::new().await.expect("Failed to start Redis");
        let redis_url = redis.url().await.expect("Failed to get Redis url");

        // Wait a moment to ensure Redis is fully ready
        tokio::time::sleep(Duration::from_millis(500)).await;

        Self {
            _redis: redis,
            redis_url,
        }
    }

    async fn cache(&self) -> RedisLinkCache {
        RedisLinkCache::connect(&self.redis_url)
            .await
            .expect("Failed to connect to Redis")
    }
}

fn test_link(id: u64, url: &str) -> Link {
    let id = LinkId::new(id);
    Link {
        id,
        original_url: url.to_string(),
        token: Some(Token::encode(id)),
        created_at: Timestamp::now(),
    }
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn redis_cache_basic_get_set() {
    let fixture = RedisTestContainer::start().await;
    let cache = fixture.cache().await;
    let link = test_link(1, "https://example.com");
    let token = link.expected_token();

    assert!(cache.get_link(&token).await.unwrap().is_none());

    cache.set_link(&token, &link).await.unwrap();

    let cached = cache.get_link(&token).await.unwrap().unwrap();
    assert_eq!(cached.original_url, "https://example.com");
    assert_eq!(cached.id, link.id);
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn redis_cache_delete() {
    let fixture = RedisTestContainer::start().await;
    let cache = fixture.cache().await;
    let link = test_link(2, "https://example.com");
    let token = link.expected_token();

    cache.set_link(&token, &link).await.unwrap();
    cache.del(&token).await.unwrap();
    assert!(cache.get_link(&token).await.unwrap().is_none());

    // Deleting a missing key is not an error
    cache.del(&token).await.unwrap();
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn redis_cache_prefixes_are_isolated() {
    let fixture = RedisTestContainer::start().await;
    let first = fixture.cache().await.with_prefix("a:");
    let second = fixture.cache().await.with_prefix("b:");
    let link = test_link(3, "https://example.com");
    let token = link.expected_token();

    first.set_link(&token, &link).await.unwrap();

    assert!(first.get_link(&token).await.unwrap().is_some());
    assert!(second.get_link(&token).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn redis_cache_ttl_expires() {
    let fixture = RedisTestContainer::start().await;
    let cache = fixture.cache().await.with_ttl(Duration::from_secs(1));
    let link = test_link(4, "https://example.com");
    let token = link.expected_token();

    cache.set_link(&token, &link).await.unwrap();
    assert!(cache.get_link(&token).await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(2_100)).await;

    assert!(cache.get_link(&token).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires a docker daemon"]
async fn layered_cache_over_redis_backfills_moka() {
    let fixture = RedisTestContainer::start().await;
    let cache = LayeredCache::new(MokaLinkCache::new(), fixture.cache().await);
    let link = test_link(5, "https://example.com");
    let token = link.expected_token();

    cache.l2().set_link(&token, &link).await.unwrap();

    assert_eq!(cache.get_link(&token).await.unwrap(), Some(link.clone()));
    assert_eq!(cache.l1().get_link(&token).await.unwrap(), Some(link));
}
