//! # DomainError
//!
//! Centralized error handling for the message board.
//! Maps domain-specific failures to actionable error types.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// The primary error type for all board operations.
#[derive(Error, Debug)]
pub enum DomainError {
    /// Malformed or missing input (e.g., blank text, bad identifier)
    #[error("validation error: {}", join_violations(.0))]
    Validation(Vec<FieldViolation>),

    /// Referenced thread or reply is absent from the board
    #[error("{0} not found with ID {1}")]
    NotFound(&'static str, String),

    /// Delete password did not match (or the target does not exist)
    #[error("invalid delete password")]
    InvalidDeletePassword,

    /// Store unreachable or the write failed
    #[error("persistence failure: {0:#}")]
    Persistence(#[from] anyhow::Error),
}

impl From<FieldViolation> for DomainError {
    fn from(violation: FieldViolation) -> Self {
        DomainError::Validation(vec![violation])
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A specialized Result type for board logic.
pub type Result<T> = std::result::Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_every_field() {
        let err = DomainError::Validation(vec![
            FieldViolation::new("text", "must not be empty"),
            FieldViolation::new("thread_id", "must be 24 hexadecimal characters"),
        ]);
        assert_eq!(
            err.to_string(),
            "validation error: text: must not be empty; thread_id: must be 24 hexadecimal characters"
        );
    }

    #[test]
    fn persistence_wraps_anyhow_chain() {
        let inner = anyhow::anyhow!("disk full").context("inserting thread");
        let err = DomainError::from(inner);
        assert_eq!(err.to_string(), "persistence failure: inserting thread: disk full");
    }
}
