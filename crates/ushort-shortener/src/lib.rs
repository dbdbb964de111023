//! URL shortening service.
//!
//! [`ShortenerService`] drives the two-phase create: insert the URL to get
//! an id from the store, then set the token derived from that id. A crash
//! between the phases leaves a link without a token; [`ShortenerService::repair`]
//! completes such links and [`ShortenerService::audit`] checks that every
//! stored token still matches its id.

pub mod maintenance;
pub mod service;

pub use maintenance::{AuditReport, RepairReport};
pub use service::ShortenerService;
pub use ushort_core::{ShortenPolicy, Shortener, ShortenerError};
