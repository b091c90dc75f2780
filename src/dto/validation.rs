//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted player or court name, in characters.
pub const MAX_NAME_LENGTH: usize = 64;

/// Validates a player or court display name.
///
/// Callers trim the name first; this rejects blank names, names longer than
/// [`MAX_NAME_LENGTH`] characters and names containing control characters.
///
/// # Examples
///
/// ```ignore
/// validate_display_name("Court 1")  // Ok
/// validate_display_name("")         // Err - blank
/// validate_display_name("Ana\nBen") // Err - control character
/// ```
pub fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name_blank");
        err.message = Some("Name must not be empty".into());
        return Err(err);
    }

    let length = name.chars().count();
    if length > MAX_NAME_LENGTH {
        let mut err = ValidationError::new("name_length");
        err.message = Some(
            format!("Name must be at most {MAX_NAME_LENGTH} characters (got {length})").into(),
        );
        return Err(err);
    }

    if name.chars().any(char::is_control) {
        let mut err = ValidationError::new("name_format");
        err.message = Some("Name must not contain control characters".into());
        return Err(err);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_display_name_valid() {
        assert!(validate_display_name("Ana").is_ok());
        assert!(validate_display_name("Court 3 (back)").is_ok());
        assert!(validate_display_name("Zoë").is_ok());
    }

    #[test]
    fn test_validate_display_name_blank() {
        assert!(validate_display_name("").is_err());
        assert!(validate_display_name("   ").is_err());
    }

    #[test]
    fn test_validate_display_name_too_long() {
        let name = "x".repeat(MAX_NAME_LENGTH + 1);
        assert!(validate_display_name(&name).is_err());
        assert!(validate_display_name(&"x".repeat(MAX_NAME_LENGTH)).is_ok());
    }

    #[test]
    fn test_validate_display_name_control_chars() {
        assert!(validate_display_name("Ana\nBen").is_err()); // newline
        assert!(validate_display_name("Ana\tBen").is_err()); // tab
    }
}
