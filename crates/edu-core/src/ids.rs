//! ID prefixes and external identifier validation.
//!
//! Internal handles are generated by the stores as `{prefix}-{8 hex chars}`.
//! External identifiers (user emails, course ids) are supplied by callers and
//! only checked for blankness; the stores treat them as opaque join keys.

use crate::errors::CoreError;

pub const PREFIX_USER_NODE: &str = "usr";
pub const PREFIX_COURSE_NODE: &str = "crs";
pub const PREFIX_COURSE: &str = "cou";

pub const ALL_PREFIXES: &[&str] = &[PREFIX_USER_NODE, PREFIX_COURSE_NODE, PREFIX_COURSE];

/// Validate an external identifier and return it without surrounding whitespace.
///
/// # Errors
///
/// Returns `CoreError::Validation` if the identifier is empty or whitespace-only.
pub fn validate_external_id<'a>(field: &str, value: &'a str) -> Result<&'a str, CoreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(trimmed)
}

/// Check whether `id` looks like `{prefix}-{8 hex}` for the given prefix.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
