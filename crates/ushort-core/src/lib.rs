//! Core types and traits for the ushort URL shortener.
//!
//! This crate provides the base62 encoder, the [`Link`] model and the
//! repository, cache and shortener contracts shared by the storage
//! backends, the shortener and the redirector.

pub mod base62;
pub mod cache;
pub mod error;
pub mod link;
pub mod repository;
pub mod shortener;
pub mod token;

pub use cache::LinkCache;
pub use error::{CacheError, CoreError, ShortenerError, StorageError};
pub use link::{Link, LinkId, LinkState};
pub use repository::{ReadRepository, Repository};
pub use shortener::{ShortenPolicy, Shortener};
pub use token::Token;
