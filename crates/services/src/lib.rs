//! # services
//!
//! Business rules for boards: sanitization, identifier generation,
//! recency ordering, reply previews, redaction and password-gated mutation.
//! Storage is reached only through the `domains::ThreadStore` port.

pub mod board_service;
pub mod sanitize;

pub use board_service::{BoardRules, BoardService};
