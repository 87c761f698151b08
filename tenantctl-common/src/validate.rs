//! Tenant name validation

use regex::Regex;
use std::sync::LazyLock;

/// Tenant usernames look like `abc123` or `abcde1234`.
static USERNAME_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{3,5}[0-9]{3,4}$").unwrap());

/// Validation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid username '{0}': expected 3-5 lowercase letters followed by 3-4 digits")]
    Username(String),
}

/// Check whether `username` is a valid tenant name.
pub fn is_username(username: &str) -> bool {
    USERNAME_REGEX.is_match(username)
}

pub fn username(username: &str) -> Result<(), ValidationError> {
    if is_username(username) {
        Ok(())
    } else {
        Err(ValidationError::Username(username.to_string()))
    }
}

pub fn default_if_empty<'a>(field: &'a str, default_value: &'a str) -> &'a str {
    if field.is_empty() {
        default_value
    } else {
        field
    }
}
