//! Link store backends.
//!
//! [`InMemoryRepository`] keeps everything in sharded concurrent maps and is
//! meant for tests and single-process deployments. [`PgRepository`] is the
//! PostgreSQL-backed store of record.

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PgRepository;
pub use ushort_core::repository::{ReadRepository, Repository, Result};
pub use ushort_core::StorageError;
