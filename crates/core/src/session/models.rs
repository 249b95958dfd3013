use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Username assigned when none can be derived from an email address.
pub const DEFAULT_USERNAME: &str = "Traveler";

/// A registered or session-only user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub email: String,
    /// Absent for users synthesised by a login that matched no registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl User {
    /// Build a user that exists only for the current session.
    pub fn session_only(email: &str) -> Self {
        Self {
            username: derive_username(email),
            email: email.to_string(),
            password: None,
        }
    }

    /// Exact, unnormalised comparison of email and password.
    pub fn matches(&self, credentials: &Credentials) -> bool {
        self.email == credentials.email
            && self.password.as_deref() == Some(credentials.password.as_str())
    }
}

/// Login form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Registration form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl Registration {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    /// The user record this registration persists: email trimmed and
    /// lowercased, username derived from the email when left blank.
    pub fn to_user(&self) -> User {
        let email = self.email.trim().to_lowercase();
        let username = if self.username.is_empty() {
            derive_username(&email)
        } else {
            self.username.clone()
        };
        User {
            username,
            email,
            password: Some(self.password.clone()),
        }
    }
}

/// Authentication state machine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    #[default]
    Unauthenticated,
    Authenticated(User),
}

/// Point-in-time copy of the session store for rendering.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub state: AuthState,
    /// A login or registration is in flight.
    pub loading: bool,
    /// Message from the last failed login or registration.
    pub error: Option<String>,
    pub authenticated_at: Option<DateTime<Utc>>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, AuthState::Authenticated(_))
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            AuthState::Authenticated(user) => Some(user),
            AuthState::Unauthenticated => None,
        }
    }
}

/// Local part of an email address, or [`DEFAULT_USERNAME`] when empty.
pub fn derive_username(email: &str) -> String {
    email
        .split('@')
        .next()
        .filter(|local| !local.is_empty())
        .unwrap_or(DEFAULT_USERNAME)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames_come_from_the_local_part() {
        assert_eq!(derive_username("ada@example.com"), "ada");
        assert_eq!(derive_username("no-at-sign"), "no-at-sign");
        assert_eq!(derive_username("@example.com"), DEFAULT_USERNAME);
        assert_eq!(derive_username(""), DEFAULT_USERNAME);
    }

    #[test]
    fn registration_normalises_email_only() {
        let user = Registration::new("", "  Foo@Bar.com ", "x").to_user();
        assert_eq!(user.email, "foo@bar.com");
        assert_eq!(user.username, "foo");
        assert_eq!(user.password.as_deref(), Some("x"));

        let named = Registration::new(" Ada ", "ada@example.com", "secret").to_user();
        assert_eq!(named.username, " Ada ");
    }

    #[test]
    fn session_only_users_never_match_credentials() {
        let user = User::session_only("ada@example.com");
        assert!(!user.matches(&Credentials::new("ada@example.com", "")));

        let json = serde_json::to_value(&user).expect("user should encode");
        assert!(json.get("password").is_none());
    }

    #[test]
    fn matching_is_case_sensitive() {
        let user = Registration::new("ada", "ada@example.com", "pw").to_user();
        assert!(user.matches(&Credentials::new("ada@example.com", "pw")));
        assert!(!user.matches(&Credentials::new("Ada@example.com", "pw")));
        assert!(!user.matches(&Credentials::new("ada@example.com", "PW")));
    }
}
