//! Media detail components: the full-size image, like button and comments.

use maud::{html, Markup, Render};

use crate::db::{Comment, MediaItem};
use crate::interaction::LikeState;

/// Full-size image with title, description and attribution.
#[derive(Debug, Clone)]
pub struct MediaDetail<'a> {
    pub item: &'a MediaItem,
}

impl<'a> MediaDetail<'a> {
    #[must_use]
    pub const fn new(item: &'a MediaItem) -> Self {
        Self { item }
    }
}

impl Render for MediaDetail<'_> {
    fn render(&self) -> Markup {
        let item = self.item;
        html! {
            figure class="media-detail" {
                img src=(item.image_url) alt=(item.title);
                figcaption {
                    h1 { (item.title) }
                    @if let Some(description) = &item.description {
                        p { (description) }
                    }
                    p class="meta" {
                        "Shared by " strong { (item.author_name) }
                        " on " time datetime=(item.created_at) { (short_date(&item.created_at)) }
                        @if let Some(views) = item.views {
                            " · " (views) " " (super::card::plural(views, "view", "views"))
                        }
                    }
                }
            }
        }
    }
}

/// Like button as a small POST form.
///
/// Anonymous visitors only see the count.
#[derive(Debug, Clone)]
pub struct LikeButton<'a> {
    pub media_id: &'a str,
    pub state: Option<LikeState>,
    pub count: i64,
}

impl<'a> LikeButton<'a> {
    #[must_use]
    pub const fn new(media_id: &'a str, state: Option<LikeState>, count: i64) -> Self {
        Self {
            media_id,
            state,
            count,
        }
    }
}

impl Render for LikeButton<'_> {
    fn render(&self) -> Markup {
        html! {
            @match self.state {
                Some(state) => {
                    form method="post" action=(format!("/media/{}/like", self.media_id)) class="like-form" {
                        button type="submit"
                            class=(if state.is_liked() { "like liked" } else { "like" })
                            aria-pressed=(state.is_liked()) {
                            (if state.is_liked() { "♥" } else { "♡" }) " " (self.count)
                        }
                    }
                }
                None => {
                    span class="like-count" { "♥ " (self.count) }
                }
            }
        }
    }
}

/// Comments, newest first.
#[derive(Debug, Clone)]
pub struct CommentList<'a> {
    pub comments: &'a [Comment],
}

impl<'a> CommentList<'a> {
    #[must_use]
    pub const fn new(comments: &'a [Comment]) -> Self {
        Self { comments }
    }
}

impl Render for CommentList<'_> {
    fn render(&self) -> Markup {
        html! {
            section class="comments" {
                h2 { "Comments (" (self.comments.len()) ")" }
                @if self.comments.is_empty() {
                    p class="muted" { "No comments yet." }
                } @else {
                    ul {
                        @for comment in self.comments {
                            li class="comment" {
                                strong { (comment.author_name) }
                                " "
                                time datetime=(comment.created_at) { (short_date(&comment.created_at)) }
                                p { (comment.content) }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// `YYYY-MM-DD` part of a stored timestamp.
fn short_date(timestamp: &str) -> &str {
    timestamp.get(..10).unwrap_or(timestamp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comment(id: &str, author: &str, content: &str) -> Comment {
        Comment {
            id: id.to_string(),
            media_id: "m1".to_string(),
            author_id: "u1".to_string(),
            author_name: author.to_string(),
            content: content.to_string(),
            created_at: "2024-03-05T10:00:00.000000Z".to_string(),
        }
    }

    #[test]
    fn test_like_button_states() {
        let liked = LikeButton::new("m1", Some(LikeState::Liked), 4)
            .render()
            .into_string();
        assert!(liked.contains(r#"action="/media/m1/like""#));
        assert!(liked.contains(r#"class="like liked""#));
        assert!(liked.contains(r#"aria-pressed="true""#));

        let not_liked = LikeButton::new("m1", Some(LikeState::NotLiked), 3)
            .render()
            .into_string();
        assert!(not_liked.contains(r#"class="like""#));

        let anonymous = LikeButton::new("m1", None, 3).render().into_string();
        assert!(!anonymous.contains("<form"));
        assert!(anonymous.contains("♥ 3"));
    }

    #[test]
    fn test_comment_list() {
        let comments = vec![comment("c2", "bob", "nice!"), comment("c1", "alice", "first")];
        let html = CommentList::new(&comments).render().into_string();
        assert!(html.contains("Comments (2)"));
        assert!(html.find("nice!").unwrap() < html.find("first").unwrap());
        assert!(html.contains(">2024-03-05<"));

        let empty = CommentList::new(&[]).render().into_string();
        assert!(empty.contains("No comments yet."));
    }
}
