//! Token cache implementations for the read path.

pub mod layered;
pub mod moka;
pub mod redis;

pub use self::moka::{MokaCacheConfig, MokaLinkCache};
pub use self::redis::RedisLinkCache;
pub use layered::LayeredCache;
pub use ushort_core::{CacheError, LinkCache};

/// Type alias for cache results.
pub type Result<T> = std::result::Result<T, CacheError>;
