//! # storage-adapters
//!
//! Implementations of the `domains::ThreadStore` port.
//!
//! * `MemoryThreadStore` keeps each board as a nested document
//!   (board → threads → replies). Always compiled; used by tests.
//! * `SqliteThreadStore` keeps the normalized `board`/`thread`/`reply`
//!   tables (feature `db-sqlite`).

pub mod memory;
#[cfg(feature = "db-sqlite")]
pub mod sqlite;

pub use memory::MemoryThreadStore;
#[cfg(feature = "db-sqlite")]
pub use sqlite::SqliteThreadStore;
