//! User and Session domain models.

use serde::{Deserialize, Serialize};

/// An identity issued by the auth service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identity id (a UUID string on the hosted backend)
    pub id: String,
    /// Email address used for the passwordless sign-in
    #[serde(default)]
    pub email: Option<String>,
}

impl User {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: Some(email.into()),
        }
    }

    /// Returns the email address, or an empty string for identities without one.
    pub fn email(&self) -> &str {
        self.email.as_deref().unwrap_or_default()
    }

    /// Returns the text before `@` in the email address.
    ///
    /// Identities without an email fall back to their id so that a
    /// synthesized profile never ends up with an empty username.
    ///
    /// # Examples
    ///
    /// ```
    /// use nerdfeed_core::user::User;
    ///
    /// let user = User::new("u-1", "ada@example.com");
    /// assert_eq!(user.email_local_part(), "ada");
    /// ```
    pub fn email_local_part(&self) -> &str {
        match self.email.as_deref() {
            Some(email) if !email.is_empty() => email.split('@').next().unwrap_or(email),
            _ => &self.id,
        }
    }
}

/// The auth service's representation of a signed-in identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    /// Unix timestamp (seconds) at which the access token expires
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

impl Session {
    /// Creates a session for the given user with no expiry information.
    pub fn new(access_token: impl Into<String>, user: User) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_in: None,
            expires_at: None,
            user,
        }
    }
}
