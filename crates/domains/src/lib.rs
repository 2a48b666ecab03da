//! message-board/crates/domains/src/lib.rs
//!
//! The domain model, error taxonomy and storage port for the message board.

pub mod errors;
pub mod models;
pub mod ports;

// Re-exporting for easier access in other crates
pub use errors::*;
pub use models::*;
pub use ports::*;
