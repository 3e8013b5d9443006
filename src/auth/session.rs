use std::sync::LazyLock;

use rand::{distributions::Alphanumeric, thread_rng, Rng};
use regex::Regex;

use crate::error::{ShareError, ShareResult};

static USERNAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]{3,32}$").expect("valid username regex"));

/// Generate a cryptographically secure random session token.
pub fn generate_session_token() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

/// Check a username: 3 to 32 letters, digits or underscores.
///
/// # Errors
///
/// Returns [`ShareError::Validation`] if the username doesn't match.
pub fn validate_username(username: &str) -> ShareResult<()> {
    if USERNAME_PATTERN.is_match(username) {
        Ok(())
    } else {
        Err(ShareError::validation(
            "Username must be 3-32 letters, digits or underscores",
        ))
    }
}

/// Extract the session token from a `Cookie` header value.
#[must_use]
pub fn token_from_cookie_header(cookies: &str) -> Option<&str> {
    cookies
        .split(';')
        .find_map(|cookie| cookie.trim().strip_prefix("session="))
        .filter(|token| !token.is_empty())
}

/// `Set-Cookie` value carrying a session token.
#[must_use]
pub fn session_cookie(token: &str, max_age_secs: u64) -> String {
    format!("session={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age_secs}")
}

/// `Set-Cookie` value clearing the session.
#[must_use]
pub fn clear_session_cookie() -> String {
    "session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_session_token() {
        let token1 = generate_session_token();
        let token2 = generate_session_token();

        assert_eq!(token1.len(), 64);
        assert_ne!(token1, token2);
        assert!(token1.chars().all(|c| c.is_alphanumeric()));
    }

    #[test]
    fn test_validate_username() {
        assert!(validate_username("alice_w").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_username("émile").is_err());
    }

    #[test]
    fn test_token_from_cookie_header() {
        assert_eq!(
            token_from_cookie_header("theme=dark; session=abc123"),
            Some("abc123")
        );
        assert_eq!(token_from_cookie_header("theme=dark"), None);
        assert_eq!(token_from_cookie_header("session="), None);
    }
}
