//! Field validation for user-submitted forms

use crate::error::{BlogError, Result};

pub const MAX_TITLE_LEN: usize = 256;
pub const MAX_USERNAME_LEN: usize = 150;

/// Non-blank text no longer than `max` characters
pub fn validate_title(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BlogError::InvalidInput(format!("{} cannot be empty", field)));
    }
    let len = value.chars().count();
    if len > max {
        return Err(BlogError::InvalidInput(format!(
            "{} exceeds {} characters (current: {})",
            field, max, len
        )));
    }
    Ok(())
}

/// Non-blank free text
pub fn validate_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(BlogError::InvalidInput(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Latin letters, digits, hyphen and underscore
pub fn validate_slug(slug: &str) -> Result<()> {
    let valid = !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(BlogError::InvalidInput(format!(
            "Invalid slug '{}': use latin letters, digits, hyphens and underscores",
            slug
        )));
    }
    Ok(())
}

/// Letters, digits and `@.+-_`, at most 150 characters
pub fn validate_username(username: &str) -> Result<()> {
    validate_title("Username", username, MAX_USERNAME_LEN)?;
    if let Some(bad) = username
        .chars()
        .find(|c| !(c.is_alphanumeric() || "@.+-_".contains(*c)))
    {
        return Err(BlogError::InvalidInput(format!(
            "Username contains invalid character '{}'",
            bad
        )));
    }
    Ok(())
}

/// Empty, or something shaped like `local@domain`
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Ok(());
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(BlogError::InvalidInput(format!(
            "Invalid email address: {}",
            email
        ))),
    }
}
