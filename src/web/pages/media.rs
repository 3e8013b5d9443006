//! Media detail page.

use maud::{html, Markup};

use crate::components::{Alert, BaseLayout, CommentForm, CommentList, LikeButton, MediaDetail};
use crate::db::MediaItem;
use crate::interaction::{CommentThread, LikeState};
use crate::session::Session;

/// Parameters for the media detail page.
#[derive(Debug)]
pub struct MediaPageParams<'a> {
    pub item: &'a MediaItem,
    pub thread: &'a CommentThread,
    /// `None` for anonymous visitors.
    pub like_state: Option<LikeState>,
    pub session: Option<&'a Session>,
    /// Inline error from a failed like or comment.
    pub error: Option<&'a str>,
}

#[must_use]
pub fn render_media_page(params: &MediaPageParams<'_>) -> Markup {
    let item = params.item;

    let content = html! {
        (MediaDetail::new(item))
        @if let Some(error) = params.error {
            (Alert::error(error))
        }
        (LikeButton::new(&item.id, params.like_state, item.likes))
        (CommentList::new(params.thread.comments()))
        @if params.session.is_some() {
            (CommentForm::new(&item.id))
        } @else {
            p class="muted" { "Sign in to like and comment." }
        }
    };

    BaseLayout::new(&item.title, params.session).render(content)
}

#[must_use]
pub fn render_not_found_page(session: Option<&Session>) -> Markup {
    let content = html! {
        h1 { "Not found" }
        p { "This picture doesn't exist or was removed." }
        a href="/" { "Back to the feed" }
    };
    BaseLayout::new("Not found", session).render(content)
}
