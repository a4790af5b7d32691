//! Common validation utilities.

use chrono::{DateTime, Utc};
use validator::{ValidateEmail, ValidationError};

/// Maximum length of a display name supplied at walk-in.
pub const MAX_DISPLAY_NAME_LENGTH: usize = 100;

/// Validates an email address and returns its normalised (trimmed, lower-case) form.
pub fn normalize_email(email: &str) -> Result<String, ValidationError> {
    let normalized = email.trim().to_lowercase();
    if normalized.validate_email() {
        Ok(normalized)
    } else {
        let mut err = ValidationError::new("email");
        err.message = Some("Email address is not valid".into());
        Err(err)
    }
}

/// Validates a display name and returns it trimmed.
pub fn normalize_display_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        let mut err = ValidationError::new("display_name_empty");
        err.message = Some("Name must not be empty".into());
        return Err(err);
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_LENGTH {
        let mut err = ValidationError::new("display_name_length");
        err.message = Some("Name must be at most 100 characters".into());
        return Err(err);
    }
    Ok(trimmed.to_string())
}

/// Validates that an event window ends strictly after it starts.
pub fn validate_event_window(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<(), ValidationError> {
    if end > start {
        Ok(())
    } else {
        let mut err = ValidationError::new("event_window");
        err.message = Some("end_datetime must be after start_datetime".into());
        Err(err)
    }
}
