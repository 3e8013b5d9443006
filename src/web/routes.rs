//! HTML routes.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Router};
use serde::Deserialize;
use tracing::{debug, warn};
use urlencoding::encode;

use super::error::{log_share_error, status_for, ApiError};
use super::pages::{
    render_error_page, render_home_error, render_home_page, render_media_page, render_not_found_page,
    render_upload_page, HomePageParams, MediaPageParams,
};
use super::upload::{publish, read_upload};
use super::AppState;
use crate::auth::MaybeSession;
use crate::error::ShareError;
use crate::feed::{Feed, SortKey};
use crate::interaction::{add_comment, CommentThread, LikeControl, ToggleOutcome};
use crate::likes::LikeKey;
use crate::storage::{allowed_content_type, format_size};

/// Create the router with all HTML routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/media/:id", get(media_detail))
        .route("/media/:id/like", post(toggle_like))
        .route("/media/:id/comments", post(post_comment))
        .route("/upload", get(upload_form).post(upload_submit))
        .route("/files/*key", get(serve_file))
        .route("/healthz", get(health))
}

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    q: Option<String>,
    sort: Option<String>,
    notice: Option<String>,
}

async fn home(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Query(params): Query<FeedParams>,
) -> Response {
    let sort = SortKey::parse_or_default(params.sort.as_deref());
    let query = params.q.unwrap_or_default();

    match Feed::load(state.repo.as_ref(), sort).await {
        Ok(feed) => {
            let html = render_home_page(&HomePageParams {
                view: feed.view(&query),
                session: session.as_ref(),
                notice: params.notice.as_deref(),
            });
            Html(html.into_string()).into_response()
        }
        Err(e) => {
            log_share_error(&e);
            let html = render_home_error(&e, sort, &query, session.as_ref());
            (status_for(&e), Html(html.into_string())).into_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DetailParams {
    error: Option<String>,
}

async fn media_detail(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(id): Path<String>,
    Query(params): Query<DetailParams>,
) -> Response {
    let mut item = match state.repo.get_media(&id).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            let html = render_not_found_page(session.as_ref());
            return (StatusCode::NOT_FOUND, Html(html.into_string())).into_response();
        }
        Err(e) => {
            log_share_error(&e);
            let html = render_error_page(&e, &format!("/media/{}", encode(&id)), session.as_ref());
            return (status_for(&e), Html(html.into_string())).into_response();
        }
    };

    match state.repo.record_view(&id).await {
        Ok(views) => item.views = Some(views),
        Err(e) => warn!(media_id = %id, "Failed to record view: {e}"),
    }

    let mut error = params.error;
    let thread = match CommentThread::load(state.repo.as_ref(), &id).await {
        Ok(thread) => thread,
        Err(e) => {
            log_share_error(&e);
            error.get_or_insert_with(|| e.user_message());
            CommentThread::new(id.clone(), Vec::new())
        }
    };

    let like_state = match &session {
        Some(session) => {
            let control = LikeControl::resolve(state.repo.as_ref(), session, &id, item.likes).await;
            Some(control.state())
        }
        None => None,
    };

    let html = render_media_page(&MediaPageParams {
        item: &item,
        thread: &thread,
        like_state,
        session: session.as_ref(),
        error: error.as_deref(),
    });
    Html(html.into_string()).into_response()
}

/// Redirect back to a detail page, carrying an inline error if there is one.
fn back_to_media(id: &str, error: Option<&str>) -> Redirect {
    match error {
        Some(message) => Redirect::to(&format!("/media/{}?error={}", encode(id), encode(message))),
        None => Redirect::to(&format!("/media/{}", encode(id))),
    }
}

async fn toggle_like(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(id): Path<String>,
) -> Response {
    let Some(session) = session else {
        return back_to_media(&id, Some(&ShareError::Unauthorized.user_message())).into_response();
    };

    let item = match state.repo.get_media(&id).await {
        Ok(Some(item)) => item,
        Ok(None) => {
            let html = render_not_found_page(Some(&session));
            return (StatusCode::NOT_FOUND, Html(html.into_string())).into_response();
        }
        Err(e) => {
            log_share_error(&e);
            return back_to_media(&id, Some(&e.user_message())).into_response();
        }
    };

    let key = LikeKey::new(id.as_str(), session.user_id.as_str());
    let Some(_guard) = state.in_flight.try_acquire(&key) else {
        debug!(media_id = %id, user_id = %session.user_id, "Like toggle already in flight");
        return back_to_media(&id, Some("Still saving your last change. Please wait a moment."))
            .into_response();
    };

    let mut control = LikeControl::resolve(state.repo.as_ref(), &session, &id, item.likes).await;
    let outcome = control.toggle(state.repo.as_ref()).await;

    match outcome {
        ToggleOutcome::Confirmed { .. } => back_to_media(&id, None),
        ToggleOutcome::RevertedWithReason { reason, .. } => {
            back_to_media(&id, Some(&reason.user_message()))
        }
    }
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct CommentForm {
    content: String,
}

async fn post_comment(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> Response {
    let Some(session) = session else {
        return back_to_media(&id, Some(&ShareError::Unauthorized.user_message())).into_response();
    };

    match add_comment(state.repo.as_ref(), &id, &form.content, &session).await {
        Ok(_) => back_to_media(&id, None),
        Err(e) => {
            log_share_error(&e);
            back_to_media(&id, Some(&e.user_message()))
        }
    }
    .into_response()
}

async fn upload_form(State(state): State<AppState>, MaybeSession(session): MaybeSession) -> Response {
    let max = format_size(state.config.max_upload_bytes);
    Html(render_upload_page(session.as_ref(), &max, None, ("", "")).into_string()).into_response()
}

async fn upload_submit(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    multipart: Multipart,
) -> Response {
    let max = format_size(state.config.max_upload_bytes);
    let Some(session) = session else {
        let message = ShareError::Unauthorized.user_message();
        let html = render_upload_page(None, &max, Some(&message), ("", ""));
        return (StatusCode::UNAUTHORIZED, Html(html.into_string())).into_response();
    };

    let request = match read_upload(multipart, state.config.max_upload_bytes).await {
        Ok(request) => request,
        Err(ApiError::Share(e)) => {
            let html = render_upload_page(Some(&session), &max, Some(&e.user_message()), ("", ""));
            return (status_for(&e), Html(html.into_string())).into_response();
        }
        Err(e) => return e.into_response(),
    };

    let title = request.title.clone();
    let description = request.description.clone();

    match publish(&state, &session, request).await {
        Ok(_) => Redirect::to("/?notice=Upload%20complete").into_response(),
        Err(e) => {
            log_share_error(&e);
            let html = render_upload_page(
                Some(&session),
                &max,
                Some(&e.user_message()),
                (&title, &description),
            );
            (status_for(&e), Html(html.into_string())).into_response()
        }
    }
}

/// Proxy uploaded objects from a private bucket.
///
/// Only raster image types are replayed; the sandbox policy keeps anything
/// else from running with this origin's cookies.
async fn serve_file(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.storage.fetch(&key).await {
        Ok(Some((bytes, content_type))) => {
            let content_type =
                allowed_content_type(&content_type).unwrap_or("application/octet-stream");
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
                    (header::CONTENT_SECURITY_POLICY, "sandbox"),
                    (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
                ],
                bytes,
            )
                .into_response()
        }
        Ok(None) => (StatusCode::NOT_FOUND, "File not found").into_response(),
        Err(e) => {
            log_share_error(&e);
            (status_for(&e), e.user_message()).into_response()
        }
    }
}

async fn health() -> &'static str {
    "ok"
}
