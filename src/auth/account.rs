//! Registration, sign-in and session lookup.

use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::password::{hash_password, validate_password_strength, verify_password};
use super::session::{generate_session_token, validate_username};
use crate::db::{self, now_timestamp, Profile};
use crate::error::{Access, ShareError, ShareResult};
use crate::session::Session;

/// A freshly issued session token and the identity behind it.
#[derive(Debug, Clone, Serialize)]
pub struct SignedIn {
    pub session: Session,
    pub token: String,
    pub expires_at: String,
}

fn backend(access: Access) -> impl Fn(anyhow::Error) -> ShareError {
    move |e| ShareError::from_backend(&e, access)
}

const ALREADY_REGISTERED: &str = "That username or email is already registered";

/// A registration that lost a race to the same username or email trips the
/// UNIQUE constraint; report it like the up-front duplicate check does.
fn profile_insert_error(err: anyhow::Error) -> ShareError {
    let duplicate = matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db_err)) if db_err.is_unique_violation()
    );
    if duplicate {
        ShareError::validation(ALREADY_REGISTERED)
    } else {
        ShareError::from_backend(&err, Access::Write)
    }
}

fn normalize_email(email: Option<&str>) -> ShareResult<Option<String>> {
    match email.map(str::trim).filter(|e| !e.is_empty()) {
        None => Ok(None),
        Some(email) => {
            let valid = email
                .split_once('@')
                .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
            if valid {
                Ok(Some(email.to_lowercase()))
            } else {
                Err(ShareError::validation("Please enter a valid email address"))
            }
        }
    }
}

/// Create an account and sign it in.
///
/// # Errors
///
/// Returns [`ShareError::Validation`] for a malformed username, email or
/// password, or when the username or email is already taken.
pub async fn register(
    pool: &SqlitePool,
    username: &str,
    email: Option<&str>,
    password: &str,
    ttl: Duration,
) -> ShareResult<SignedIn> {
    let username = username.trim();
    validate_username(username)?;
    let email = normalize_email(email)?;
    validate_password_strength(password)?;

    if db::profile_exists(pool, username, email.as_deref())
        .await
        .map_err(backend(Access::Read))?
    {
        return Err(ShareError::validation(ALREADY_REGISTERED));
    }

    let password_hash = hash_password(password).map_err(backend(Access::Write))?;
    let user_id = uuid::Uuid::new_v4().to_string();
    db::create_profile(pool, &user_id, username, email.as_deref(), &password_hash)
        .await
        .map_err(profile_insert_error)?;

    info!(user_id = %user_id, username, "Registered new profile");

    let mut session = Session::new(user_id, username);
    session.email = email;
    issue_session(pool, session, ttl).await
}

/// Sign in with a username or email and a password.
///
/// # Errors
///
/// Returns [`ShareError::Unauthorized`] when the credentials don't match.
pub async fn login(
    pool: &SqlitePool,
    login: &str,
    password: &str,
    ttl: Duration,
) -> ShareResult<SignedIn> {
    let profile = db::get_profile_by_login(pool, login.trim())
        .await
        .map_err(backend(Access::Read))?;

    let Some(profile) = profile else {
        debug!(login, "Sign-in for unknown login");
        return Err(ShareError::Unauthorized);
    };

    if !verify_password(password, &profile.password_hash).map_err(backend(Access::Read))? {
        warn!(user_id = %profile.id, "Sign-in with wrong password");
        return Err(ShareError::Unauthorized);
    }

    issue_session(pool, Session::from(&profile), ttl).await
}

async fn issue_session(pool: &SqlitePool, session: Session, ttl: Duration) -> ShareResult<SignedIn> {
    let token = generate_session_token();
    let ttl = chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(30));
    let expires_at = (Utc::now() + ttl).to_rfc3339_opts(SecondsFormat::Micros, true);

    db::create_session(pool, &token, &session.user_id, &expires_at)
        .await
        .map_err(backend(Access::Write))?;

    Ok(SignedIn {
        session,
        token,
        expires_at,
    })
}

/// Drop a session token. Unknown tokens are ignored.
///
/// # Errors
///
/// Returns a backend error if the delete fails.
pub async fn logout(pool: &SqlitePool, token: &str) -> ShareResult<()> {
    db::delete_session(pool, token)
        .await
        .map_err(backend(Access::Write))
}

/// Resolve a token into a [`Session`].
///
/// Expired sessions are deleted on sight and resolve to `None`, as do tokens
/// whose profile no longer exists.
///
/// # Errors
///
/// Returns a backend error if the lookup fails.
pub async fn resolve_session(pool: &SqlitePool, token: &str) -> ShareResult<Option<Session>> {
    let Some(record) = db::get_session_by_token(pool, token)
        .await
        .map_err(backend(Access::Read))?
    else {
        return Ok(None);
    };

    if record.expires_at < now_timestamp() {
        debug!(user_id = %record.user_id, "Dropping expired session");
        if let Err(e) = db::delete_session(pool, token).await {
            warn!("Failed to delete expired session: {e:#}");
        }
        return Ok(None);
    }

    let profile: Option<Profile> = db::get_profile(pool, &record.user_id)
        .await
        .map_err(backend(Access::Read))?;

    Ok(profile.as_ref().map(Session::from))
}
