//! # api-adapters
//!
//! The HTTP routing and orchestration layer for the message board.

pub mod dto;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::build_router;
