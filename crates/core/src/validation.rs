//! Form checks run by frontends before dispatching to the stores.
//!
//! The stores accept anything; these rules only exist so a user gets
//! feedback on obviously malformed input.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::session::{Credentials, Registration};

/// Minimum password length accepted at registration.
pub const MIN_PASSWORD_LEN: usize = 6;
/// Minimum username length when one is given.
pub const MIN_USERNAME_LEN: usize = 3;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("invalid email regex"));

/// Form field a validation message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Email,
    Password,
}

/// A single rejected field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Email is required")]
    EmailRequired,
    #[error("Invalid email address")]
    EmailInvalid,
    #[error("Password is required")]
    PasswordRequired,
    #[error("Password must be at least {min} characters")]
    PasswordTooShort { min: usize },
    #[error("Username must be at least {min} characters")]
    UsernameTooShort { min: usize },
}

impl ValidationError {
    /// Field the error should be displayed next to.
    pub fn field(&self) -> Field {
        match self {
            Self::EmailRequired | Self::EmailInvalid => Field::Email,
            Self::PasswordRequired | Self::PasswordTooShort { .. } => Field::Password,
            Self::UsernameTooShort { .. } => Field::Username,
        }
    }
}

/// Check a login form. Reports every failing field.
pub fn validate_login(credentials: &Credentials) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    check_email(&credentials.email, &mut errors);
    if credentials.password.is_empty() {
        errors.push(ValidationError::PasswordRequired);
    }
    finish(errors)
}

/// Check a registration form. A blank username is allowed and will be
/// derived from the email.
pub fn validate_registration(registration: &Registration) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let username = registration.username.trim();
    if !username.is_empty() && username.chars().count() < MIN_USERNAME_LEN {
        errors.push(ValidationError::UsernameTooShort {
            min: MIN_USERNAME_LEN,
        });
    }
    check_email(&registration.email, &mut errors);
    if registration.password.is_empty() {
        errors.push(ValidationError::PasswordRequired);
    } else if registration.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(ValidationError::PasswordTooShort {
            min: MIN_PASSWORD_LEN,
        });
    }
    finish(errors)
}

fn check_email(email: &str, errors: &mut Vec<ValidationError>) {
    let email = email.trim();
    if email.is_empty() {
        errors.push(ValidationError::EmailRequired);
    } else if !EMAIL_RE.is_match(email) {
        errors.push(ValidationError::EmailInvalid);
    }
}

fn finish(errors: Vec<ValidationError>) -> Result<(), Vec<ValidationError>> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
