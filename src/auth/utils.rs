use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::sync::LazyLock;

use crate::error::{Error, Result};

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

/// Emails are compared case-insensitively and without surrounding whitespace.
pub(super) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub(super) fn is_email(email: &str) -> bool {
    EMAIL.as_ref().is_some_and(|regex| regex.is_match(email))
}

/// Returns the normalized email once both fields pass the local checks.
pub(super) fn credentials(email: &str, password: &SecretString) -> Result<String> {
    let email = normalize_email(email);
    if !is_email(&email) {
        return Err(Error::validation("invalid email"));
    }
    if password.expose_secret().is_empty() {
        return Err(Error::validation("password is required"));
    }
    Ok(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        for email in ["a@example.com", "first.last+tag@mail.example.org"] {
            assert!(is_email(email), "{email}");
        }
        for email in ["", "plain", "@example.com", "a@example", "a b@example.com"] {
            assert!(!is_email(email), "{email}");
        }
    }

    #[test]
    fn credentials_normalize_and_require_a_password() {
        let password = SecretString::from("pw".to_string());
        assert_eq!(
            credentials("  A@Example.COM ", &password).ok().as_deref(),
            Some("a@example.com")
        );
        assert!(credentials("a@example.com", &SecretString::from(String::new()))
            .is_err_and(|err| err.is_validation()));
        assert!(credentials("nope", &password).is_err_and(|err| err.is_validation()));
    }
}
