//! Resolution of short tokens back to their original URLs.
//!
//! [`RedirectorService`] reads through any [`ReadRepository`]; wrapping that
//! repository in a [`CachedRepository`] adds transparent caching via any
//! [`LinkCache`](ushort_core::LinkCache).
//!
//! # Example
//!
//! ```rust
//! use ushort_cache::MokaLinkCache;
//! use ushort_redirector::{CachedRepository, Redirector, RedirectorService};
//! use ushort_storage::InMemoryRepository;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = InMemoryRepository::new();
//! let cached = CachedRepository::new(store, MokaLinkCache::new());
//! let service = RedirectorService::new(cached);
//!
//! match service.resolve("b").await {
//!     Ok(url) => println!("Redirect to: {url}"),
//!     Err(e) => println!("No redirect: {e}"),
//! }
//! # Ok(())
//! # }
//! ```

mod error;
pub mod redirector;
pub mod repository;
pub mod service;

pub use error::RedirectorError;
pub use redirector::Redirector;
pub use repository::CachedRepository;
pub use service::RedirectorService;
pub use ushort_core::ReadRepository;

pub type Result<T> = std::result::Result<T, RedirectorError>;
