//! The signed-in identity, passed explicitly to everything that acts on a
//! user's behalf.

use serde::Serialize;

use crate::db::Profile;

/// Name used for comments when a session has neither email nor username.
pub const ANONYMOUS: &str = "Anonymous";

/// An authenticated user for the lifetime of one sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub user_id: String,
    pub username: String,
    pub email: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(user_id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            username: username.into(),
            email: None,
        }
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Name written onto comments at creation time.
    ///
    /// The local part of the email if there is one, else the username.
    #[must_use]
    pub fn author_name(&self) -> String {
        self.email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .map(str::trim)
            .filter(|local| !local.is_empty())
            .or_else(|| Some(self.username.trim()).filter(|u| !u.is_empty()))
            .unwrap_or(ANONYMOUS)
            .to_string()
    }
}

impl From<&Profile> for Session {
    fn from(profile: &Profile) -> Self {
        Self {
            user_id: profile.id.clone(),
            username: profile.username.clone(),
            email: profile.email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_name_prefers_email_local_part() {
        let session = Session::new("u1", "alice_w").with_email("alice@example.com");
        assert_eq!(session.author_name(), "alice");
    }

    #[test]
    fn test_author_name_falls_back_to_username() {
        assert_eq!(Session::new("u1", "alice_w").author_name(), "alice_w");
        let session = Session::new("u1", "alice_w").with_email("@example.com");
        assert_eq!(session.author_name(), "alice_w");
    }

    #[test]
    fn test_author_name_anonymous() {
        assert_eq!(Session::new("u1", "  ").author_name(), ANONYMOUS);
    }
}
