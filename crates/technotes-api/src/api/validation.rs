// Input validation for the resource APIs
//
// Last-resort size limits to keep oversized payloads out of the store.
// These are hard limits, not configurable.

use crate::error::ApiError;

/// Maximum size for a username.
pub const MAX_USERNAME_BYTES: usize = 128;

/// Maximum size for a password before hashing.
pub const MAX_PASSWORD_BYTES: usize = 512;

/// Maximum size for a note title.
pub const MAX_TITLE_BYTES: usize = 512;

/// Maximum size for a note body.
pub const MAX_TEXT_BYTES: usize = 64 * 1024; // 64 KB

/// Generic validation error message returned to clients.
/// Intentionally vague to avoid leaking which field exceeded limits.
pub const VALIDATION_ERROR_MESSAGE: &str = "Input exceeds allowed limits";

/// Validation error - returns generic message to avoid leaking details
pub struct ValidationError;

impl From<ValidationError> for ApiError {
    fn from(_: ValidationError) -> Self {
        ApiError::bad_request(VALIDATION_ERROR_MESSAGE)
    }
}

fn check(value: &str, max: usize, field: &str) -> Result<(), ValidationError> {
    if value.len() > max {
        tracing::warn!(
            "{} exceeds limit: {} bytes (max: {})",
            field,
            value.len(),
            max
        );
        return Err(ValidationError);
    }
    Ok(())
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    check(username, MAX_USERNAME_BYTES, "username")
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check(password, MAX_PASSWORD_BYTES, "password")
}

pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    check(title, MAX_TITLE_BYTES, "title")
}

pub fn validate_text(text: &str) -> Result<(), ValidationError> {
    check(text, MAX_TEXT_BYTES, "text")
}
