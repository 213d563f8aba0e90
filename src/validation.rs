//! Input validation for registration, login and catalog drafts.

/// Maximum player display name length (characters).
pub const MAX_NAME_LEN: usize = 50;
/// Maximum email length (RFC 5321 path limit).
pub const MAX_EMAIL_LEN: usize = 254;
/// Upper bound on password length to cap hashing cost.
pub const MAX_PASSWORD_LEN: usize = 128;
/// Maximum length of quest titles and item names.
pub const MAX_TITLE_LEN: usize = 100;
/// Maximum length of quest descriptions and item effects.
pub const MAX_TEXT_LEN: usize = 2000;

/// Validation errors with messages suitable for showing to the player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Missing { field: &'static str },

    #[error("{field} is too long (maximum {max} characters)")]
    TooLong { field: &'static str, max: usize },

    #[error("{field} contains control characters")]
    ControlCharacters { field: &'static str },

    #[error("email address is not valid")]
    InvalidEmail,

    #[error("password must be at least {min} characters long")]
    PasswordTooShort { min: usize },

    #[error("password is too long (maximum {max} characters)")]
    PasswordTooLong { max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: u64, max: u64 },
}

/// Trim a required free-text field and enforce length and character rules.
pub fn required_text(field: &'static str, value: &str, max: usize) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    if trimmed.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    if trimmed.chars().any(|c| c.is_control() && c != '\n') {
        return Err(ValidationError::ControlCharacters { field });
    }
    Ok(trimmed.to_string())
}

/// Validate a player's display name
pub fn validate_player_name(name: &str) -> Result<String, ValidationError> {
    let name = required_text("name", name, MAX_NAME_LEN)?;
    if name.contains('\n') {
        return Err(ValidationError::ControlCharacters { field: "name" });
    }
    Ok(name)
}

/// Validate and canonicalize (lowercase) an email address.
pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Missing { field: "email" });
    }
    if trimmed.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::TooLong {
            field: "email",
            max: MAX_EMAIL_LEN,
        });
    }
    if trimmed.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(ValidationError::InvalidEmail);
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ValidationError::InvalidEmail);
    };
    if local.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(trimmed.to_ascii_lowercase())
}

/// Check password length rules. The password itself is never trimmed.
pub fn validate_password(password: &str, min_len: usize) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::Missing { field: "password" });
    }
    let len = password.chars().count();
    if len < min_len {
        return Err(ValidationError::PasswordTooShort { min: min_len });
    }
    if len > MAX_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooLong {
            max: MAX_PASSWORD_LEN,
        });
    }
    Ok(())
}
