/// Account input validation
///
/// Validates usernames and e-mail addresses before anything touches the host
use crate::error::BotError;

/// Longest login name accepted by the shadow utilities
pub const MAX_USERNAME_LENGTH: usize = 32;

/// Validation error detail
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

/// Validation result with detailed errors
pub type ValidationResult = Result<(), Vec<ValidationError>>;

fn error(field: &str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field: field.to_string(),
        message: message.into(),
    }
}

/// Validate an OS login name.
///
/// Lowercase ASCII letters, digits, `_` and `-`, starting with a letter or `_`.
pub fn validate_username(username: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if username.is_empty() {
        errors.push(error("username", "Username cannot be empty"));
        return Err(errors);
    }

    if username.len() > MAX_USERNAME_LENGTH {
        errors.push(error(
            "username",
            format!(
                "Username exceeds maximum length of {} characters: {}",
                MAX_USERNAME_LENGTH,
                username.len()
            ),
        ));
    }

    let valid_start = username
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_lowercase() || c == '_');
    if !valid_start {
        errors.push(error(
            "username",
            "Username must start with a lowercase letter or underscore",
        ));
    }

    if let Some(bad) = username
        .chars()
        .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '_' || *c == '-'))
    {
        errors.push(error(
            "username",
            format!("Username contains invalid character '{}'", bad),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Loose e-mail check: something before an `@`, and a `.` at least two
/// characters after it.
pub fn is_valid_email(email: &str) -> bool {
    let Some(at) = email.find('@') else {
        return false;
    };
    if at < 1 {
        return false;
    }
    email
        .get(at + 2..)
        .map_or(false, |domain| domain.contains('.'))
}

pub fn validate_email(email: &str) -> ValidationResult {
    if email.chars().any(char::is_whitespace) {
        return Err(vec![error("email", "Email address cannot contain whitespace")]);
    }
    if !is_valid_email(email) {
        return Err(vec![error("email", format!("Invalid email address: {}", email))]);
    }
    Ok(())
}

/// Validate everything needed to provision a new account
pub fn validate_new_account(username: &str, email: &str) -> ValidationResult {
    let mut errors = Vec::new();
    if let Err(e) = validate_username(username) {
        errors.extend(e);
    }
    if let Err(e) = validate_email(email) {
        errors.extend(e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Helper to convert validation errors to BotError
pub fn validation_errors_to_bot_error(errors: Vec<ValidationError>) -> BotError {
    let messages: Vec<String> = errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect();

    BotError::Validation(messages.join("; "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_usernames() {
        for name in ["alice", "_svc", "bob-2", "a"] {
            assert!(validate_username(name).is_ok(), "{}", name);
        }
    }

    #[test]
    fn test_invalid_usernames() {
        assert!(validate_username("").is_err());
        assert!(validate_username("Alice").is_err());
        assert!(validate_username("9lives").is_err());
        assert!(validate_username("rm -rf").is_err());
        assert!(validate_username("a;b").is_err());
        assert!(validate_username(&"a".repeat(33)).is_err());
    }

    #[test]
    fn test_email_rules() {
        assert!(is_valid_email("user@example.com"));
        assert!(is_valid_email("a@bc.d"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("user.example.com"));
        assert!(!is_valid_email("user@.com"));
        assert!(!is_valid_email("user@com"));
        assert!(validate_email("user @example.com").is_err());
    }

    #[test]
    fn test_errors_collected_and_converted() {
        let errors = validate_new_account("Bad Name", "nope").unwrap_err();
        assert!(errors.len() >= 3);

        match validation_errors_to_bot_error(errors) {
            BotError::Validation(message) => {
                assert!(message.contains("username"));
                assert!(message.contains("email"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
