//! JSON API routes.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{log_share_error, status_for, ApiError};
use super::upload::{publish, read_upload};
use super::AppState;
use crate::auth::{self, clear_session_cookie, request_token, session_cookie, RequireSession, SignedIn};
use crate::db::{Comment, MediaItem};
use crate::error::ShareError;
use crate::feed::{EmptyReason, Feed, SortKey};
use crate::interaction::{add_comment, LikeControl, ToggleOutcome};
use crate::likes::LikeKey;
use crate::session::Session;

type ApiResult<T> = Result<T, ApiError>;

/// Create the router with all JSON API routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/media", get(list_media).post(create_media))
        .route("/api/media/:id", get(get_media))
        .route("/api/media/:id/like", post(toggle_like))
        .route("/api/media/:id/comments", get(list_comments).post(create_comment))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/me", get(me))
}

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    q: Option<String>,
    sort: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedResponse<'a> {
    sort: SortKey,
    items: Vec<&'a MediaItem>,
    total: usize,
    empty_reason: Option<EmptyReason>,
}

async fn list_media(State(state): State<AppState>, Query(params): Query<FeedQuery>) -> ApiResult<Response> {
    let sort = SortKey::parse_or_default(params.sort.as_deref());
    let query = params.q.unwrap_or_default();

    let feed = Feed::load(state.repo.as_ref(), sort).await?;
    let view = feed.view(&query);
    let empty_reason = view.empty_reason();

    Ok(Json(FeedResponse {
        sort: view.sort,
        items: view.items,
        total: view.total,
        empty_reason,
    })
    .into_response())
}

async fn create_media(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    multipart: Multipart,
) -> ApiResult<(StatusCode, Json<MediaItem>)> {
    let request = read_upload(multipart, state.config.max_upload_bytes).await?;
    let item = publish(&state, &session, request).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn get_media(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<MediaItem>> {
    state
        .repo
        .get_media(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ShareError::NotFound(format!("media {id}")).into())
}

async fn require_media(state: &AppState, id: &str) -> ApiResult<MediaItem> {
    state
        .repo
        .get_media(id)
        .await?
        .ok_or_else(|| ShareError::NotFound(format!("media {id}")).into())
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    liked: bool,
    likes: i64,
    confirmed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Toggle the caller's like.
///
/// A reverted toggle still returns the restored state, with the status of
/// the failure and the reason in `error`.
async fn toggle_like(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let item = require_media(&state, &id).await?;

    let key = LikeKey::new(id.as_str(), session.user_id.as_str());
    let Some(_guard) = state.in_flight.try_acquire(&key) else {
        return Err(ApiError::Busy);
    };

    let mut control = LikeControl::resolve(state.repo.as_ref(), &session, &id, item.likes).await;
    let outcome = control.toggle(state.repo.as_ref()).await;

    let response = match outcome {
        ToggleOutcome::Confirmed {
            state: like_state,
            count,
        } => (
            StatusCode::OK,
            Json(LikeResponse {
                liked: like_state.is_liked(),
                likes: count,
                confirmed: true,
                error: None,
            }),
        ),
        ToggleOutcome::RevertedWithReason {
            state: like_state,
            count,
            reason,
        } => {
            log_share_error(&reason);
            (
                status_for(&reason),
                Json(LikeResponse {
                    liked: like_state.is_liked(),
                    likes: count,
                    confirmed: false,
                    error: Some(reason.user_message()),
                }),
            )
        }
    };

    Ok(response.into_response())
}

async fn list_comments(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Vec<Comment>>> {
    Ok(Json(state.repo.list_comments(&id).await?))
}

#[derive(Debug, Deserialize)]
pub struct NewCommentBody {
    content: String,
}

async fn create_comment(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<String>,
    Json(body): Json<NewCommentBody>,
) -> ApiResult<(StatusCode, Json<Comment>)> {
    require_media(&state, &id).await?;
    let comment = add_comment(state.repo.as_ref(), &id, &body.content, &session).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
    username: String,
    email: Option<String>,
    password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    login: String,
    password: String,
}

fn signed_in_response(status: StatusCode, signed_in: SignedIn, ttl_secs: u64) -> Response {
    let cookie = session_cookie(&signed_in.token, ttl_secs);
    (status, [(header::SET_COOKIE, cookie)], Json(signed_in)).into_response()
}

async fn register(State(state): State<AppState>, Json(body): Json<RegisterBody>) -> ApiResult<Response> {
    let ttl = state.config.session_ttl;
    let signed_in = auth::register(
        state.db.pool(),
        &body.username,
        body.email.as_deref(),
        &body.password,
        ttl,
    )
    .await?;
    Ok(signed_in_response(StatusCode::CREATED, signed_in, ttl.as_secs()))
}

async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> ApiResult<Response> {
    let ttl = state.config.session_ttl;
    let signed_in = auth::login(state.db.pool(), &body.login, &body.password, ttl).await?;
    info!(user_id = %signed_in.session.user_id, "Signed in");
    Ok(signed_in_response(StatusCode::OK, signed_in, ttl.as_secs()))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> ApiResult<Response> {
    if let Some(token) = request_token(&headers) {
        auth::logout(state.db.pool(), &token).await?;
    }
    Ok((
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
        .into_response())
}

async fn me(RequireSession(session): RequireSession) -> Json<Session> {
    Json(session)
}
