//! Request DTOs.
//!
//! Missing fields deserialize to empty strings so that they surface as
//! field-level validation errors rather than opaque decode failures.

use domains::{FieldViolation, ReplyId, ThreadId};
use serde::Deserialize;
use validator::{Validate, ValidationError};

/// Body of `POST /api/threads/{board}`.
#[derive(Debug, Deserialize, Validate)]
pub struct NewThreadForm {
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 8000, message = "Must be at most 8000 characters")
    )]
    pub text: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Must be 1-128 characters"))]
    pub delete_password: String,
}

/// Body of `PUT /api/threads/{board}` and query of `GET /api/replies/{board}`.
#[derive(Debug, Deserialize, Validate)]
pub struct ThreadRef {
    #[serde(default)]
    #[validate(custom(function = "valid_thread_id"))]
    pub thread_id: String,
}

/// Body of `DELETE /api/threads/{board}`.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteThreadForm {
    #[serde(default)]
    #[validate(custom(function = "valid_thread_id"))]
    pub thread_id: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Must be 1-128 characters"))]
    pub delete_password: String,
}

/// Body of `POST /api/replies/{board}`.
#[derive(Debug, Deserialize, Validate)]
pub struct NewReplyForm {
    #[serde(default)]
    #[validate(custom(function = "valid_thread_id"))]
    pub thread_id: String,
    #[serde(default)]
    #[validate(
        custom(function = "not_blank"),
        length(max = 8000, message = "Must be at most 8000 characters")
    )]
    pub text: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Must be 1-128 characters"))]
    pub delete_password: String,
}

/// Body of `PUT /api/replies/{board}`.
#[derive(Debug, Deserialize, Validate)]
pub struct ReplyRef {
    #[serde(default)]
    #[validate(custom(function = "valid_thread_id"))]
    pub thread_id: String,
    #[serde(default)]
    #[validate(custom(function = "valid_reply_id"))]
    pub reply_id: String,
}

/// Body of `DELETE /api/replies/{board}`.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteReplyForm {
    #[serde(default)]
    #[validate(custom(function = "valid_thread_id"))]
    pub thread_id: String,
    #[serde(default)]
    #[validate(custom(function = "valid_reply_id"))]
    pub reply_id: String,
    #[serde(default)]
    #[validate(length(min = 1, max = 128, message = "Must be 1-128 characters"))]
    pub delete_password: String,
}

// ============================================================================
// Custom Validators
// ============================================================================

fn to_validation_error(code: &'static str, violation: FieldViolation) -> ValidationError {
    ValidationError::new(code).with_message(violation.message.into())
}

/// Validate that a string is not empty after trimming whitespace.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("not_blank").with_message("Must not be empty".into()));
    }
    Ok(())
}

pub fn valid_thread_id(value: &str) -> Result<(), ValidationError> {
    ThreadId::parse(value)
        .map(|_| ())
        .map_err(|v| to_validation_error("thread_id", v))
}

pub fn valid_reply_id(value: &str) -> Result<(), ValidationError> {
    ReplyId::parse(value)
        .map(|_| ())
        .map_err(|v| to_validation_error("reply_id", v))
}
