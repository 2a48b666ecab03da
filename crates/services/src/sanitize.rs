//! Input normalization applied before anything reaches the store.

use domains::FieldViolation;

/// Trims and HTML-escapes post text. Blank input is rejected.
pub fn sanitize_text(raw: &str) -> Result<String, FieldViolation> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldViolation::new("text", "must not be empty"));
    }
    Ok(html_escape::encode_safe(trimmed).into_owned())
}

/// Delete passwords are stored as given; only presence is checked.
pub fn require_password(raw: &str) -> Result<&str, FieldViolation> {
    if raw.is_empty() {
        return Err(FieldViolation::new("delete_password", "must not be empty"));
    }
    Ok(raw)
}
