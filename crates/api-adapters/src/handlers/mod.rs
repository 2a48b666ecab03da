//! # Handlers
//!
//! This module coordinates the flow between HTTP requests and `BoardService`.
//! Handlers hold no state of their own; everything lives in the store.

pub mod replies;
pub mod threads;

use std::sync::Arc;

use domains::DomainError;
use services::BoardService;

use crate::error::ApiError;

/// Body of a successful report.
pub const REPORTED: &str = "reported";
/// Body of a successful delete.
pub const DELETED: &str = "success";
/// Body of a rejected delete. Sent with a 200 so the status code does not
/// reveal whether the item exists.
pub const INVALID_DELETE_PASSWORD: &str = "Invalid delete password";

/// State shared across all request tasks.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<BoardService>,
}

impl AppState {
    pub fn new(service: BoardService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }
}

/// Maps the outcome of a password-gated delete to its plain-text answer.
fn delete_outcome(result: domains::Result<()>) -> Result<&'static str, ApiError> {
    match result {
        Ok(()) => Ok(DELETED),
        Err(DomainError::InvalidDeletePassword) => Ok(INVALID_DELETE_PASSWORD),
        Err(err) => Err(err.into()),
    }
}

/// Health check handler.
pub async fn health_check() -> &'static str {
    "OK"
}
