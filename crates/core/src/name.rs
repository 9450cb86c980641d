//! Validation for module and action names used to build permission slugs.

use crate::error::{DomainError, DomainResult};

/// Validate a module or action name.
///
/// Names are lowercase ASCII, start with a letter and may contain digits and
/// `_`. The `.` separator and the `*` wildcard are therefore never part of a
/// name, which keeps `"module.action"` slugs unambiguous.
pub fn validate_identifier(kind: &str, value: &str) -> DomainResult<()> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(DomainError::validation(format!("{kind} name must not be empty")));
    };

    if !first.is_ascii_lowercase() {
        return Err(DomainError::validation(format!(
            "{kind} name '{value}' must start with a lowercase letter"
        )));
    }

    if let Some(bad) = chars.find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_')) {
        return Err(DomainError::validation(format!(
            "{kind} name '{value}' contains invalid character '{bad}'"
        )));
    }

    Ok(())
}
