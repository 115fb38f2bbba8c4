//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::services::participant_service::{MIN_AUTHOR_CHARS, MIN_TEXT_CHARS};

/// Entry text must keep at least [`MIN_TEXT_CHARS`] characters once trimmed.
pub fn validate_entry_text(text: &str) -> Result<(), ValidationError> {
    min_trimmed_chars(text, MIN_TEXT_CHARS, "entry_text_length", "Entry text")
}

/// Author name must keep at least [`MIN_AUTHOR_CHARS`] characters once trimmed.
pub fn validate_author_name(name: &str) -> Result<(), ValidationError> {
    min_trimmed_chars(name, MIN_AUTHOR_CHARS, "author_name_length", "Author name")
}

fn min_trimmed_chars(
    value: &str,
    min: usize,
    code: &'static str,
    label: &str,
) -> Result<(), ValidationError> {
    let count = value.trim().chars().count();
    if count < min {
        let mut err = ValidationError::new(code);
        err.message = Some(format!("{label} must be at least {min} characters (got {count})").into());
        return Err(err);
    }
    Ok(())
}
