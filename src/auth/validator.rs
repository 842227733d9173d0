//! Enrollment input validator
//!
//! Checks usernames and passwords before any hashing work is spent on them.
//! Usernames are trimmed; passwords are used exactly as submitted.

use crate::error::EnrollError;

/// Length limits applied to enrollment input, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputLimits {
    pub max_username_length: usize,
    pub max_password_length: usize,
}

impl Default for InputLimits {
    fn default() -> Self {
        Self {
            max_username_length: 64,
            max_password_length: 1024,
        }
    }
}

/// Validates a username and returns its trimmed form.
///
/// Quotes, braces and other printable characters are allowed; the record
/// codec escapes them. Control characters are refused outright.
pub fn validate_username<'a>(username: &'a str, limits: &InputLimits) -> Result<&'a str, EnrollError> {
    let trimmed = username.trim();

    if trimmed.is_empty() {
        return Err(EnrollError::InvalidInput("username must not be empty".into()));
    }

    if trimmed.len() > limits.max_username_length {
        return Err(EnrollError::InvalidInput(format!(
            "username must be at most {} bytes",
            limits.max_username_length
        )));
    }

    if trimmed.chars().any(char::is_control) {
        return Err(EnrollError::InvalidInput(
            "username must not contain control characters".into(),
        ));
    }

    Ok(trimmed)
}

/// Validates a password. Never echoes the password in the error.
pub fn validate_password(password: &str, limits: &InputLimits) -> Result<(), EnrollError> {
    if password.trim().is_empty() {
        return Err(EnrollError::InvalidInput("password must not be empty".into()));
    }

    if password.len() > limits.max_password_length {
        return Err(EnrollError::InvalidInput(format!(
            "password must be at most {} bytes",
            limits.max_password_length
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_invalid<T: std::fmt::Debug>(result: Result<T, EnrollError>) -> bool {
        matches!(result, Err(EnrollError::InvalidInput(_)))
    }

    #[test]
    fn trims_username() {
        let limits = InputLimits::default();
        assert_eq!(validate_username("  alice ", &limits).unwrap(), "alice");
    }

    #[test]
    fn rejects_empty_and_blank_input() {
        let limits = InputLimits::default();
        assert!(is_invalid(validate_username("", &limits)));
        assert!(is_invalid(validate_username(" \t ", &limits)));
        assert!(is_invalid(validate_password("", &limits)));
        assert!(is_invalid(validate_password("   ", &limits)));
    }

    #[test]
    fn rejects_control_characters_in_username() {
        let limits = InputLimits::default();
        assert!(is_invalid(validate_username("ali\nce", &limits)));
        assert!(is_invalid(validate_username("ali\0ce", &limits)));
        assert!(is_invalid(validate_username("ali\rce", &limits)));
    }

    #[test]
    fn accepts_delimiter_characters_in_username() {
        let limits = InputLimits::default();
        assert_eq!(
            validate_username("al\"ice}", &limits).unwrap(),
            "al\"ice}"
        );
    }

    #[test]
    fn enforces_length_limits() {
        let limits = InputLimits {
            max_username_length: 5,
            max_password_length: 8,
        };
        assert!(validate_username("alice", &limits).is_ok());
        assert!(is_invalid(validate_username("alice2", &limits)));
        assert!(validate_password("12345678", &limits).is_ok());
        assert!(is_invalid(validate_password("123456789", &limits)));
    }

    #[test]
    fn password_error_does_not_echo_password() {
        let limits = InputLimits {
            max_username_length: 64,
            max_password_length: 4,
        };
        let err = validate_password("s3cret!", &limits).unwrap_err();
        assert!(!err.to_string().contains("s3cret!"));
    }
}
