use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use sqlx::SqlitePool;
use tracing::warn;

use super::account::resolve_session;
use super::session::token_from_cookie_header;
use crate::session::Session;

/// Session token sent with a request: `Authorization: Bearer <token>` wins
/// over the `session` cookie.
#[must_use]
pub fn request_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer
        .or_else(|| {
            headers
                .get(header::COOKIE)
                .and_then(|h| h.to_str().ok())
                .and_then(token_from_cookie_header)
        })
        .map(String::from)
}

/// Current signed-in user (if any).
/// Use this extractor when authentication is optional.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let pool = SqlitePool::from_ref(state);

        let Some(token) = request_token(&parts.headers) else {
            return Ok(Self(None));
        };

        match resolve_session(&pool, &token).await {
            Ok(session) => Ok(Self(session)),
            Err(e) => {
                warn!("Session lookup failed: {e}");
                Ok(Self(None))
            }
        }
    }
}

/// Current signed-in user (required).
/// Returns 401 with a JSON error body if nobody is signed in.
#[derive(Debug, Clone)]
pub struct RequireSession(pub Session);

#[async_trait]
impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
    SqlitePool: FromRef<S>,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let MaybeSession(session) = MaybeSession::from_request_parts(parts, state).await?;

        session.map(Self).ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Please sign in first." })),
            )
                .into_response()
        })
    }
}
