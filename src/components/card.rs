//! Card components for displaying media in the feed.

use maud::{html, Markup, Render};

use crate::db::MediaItem;
use crate::feed::EmptyReason;

/// A media card: thumbnail, title, author and like count.
///
/// # Example
///
/// ```ignore
/// use crate::components::card::MediaCard;
///
/// let card = MediaCard::new(&item);
/// ```
#[derive(Debug, Clone)]
pub struct MediaCard<'a> {
    pub item: &'a MediaItem,
}

impl<'a> MediaCard<'a> {
    #[must_use]
    pub const fn new(item: &'a MediaItem) -> Self {
        Self { item }
    }
}

impl Render for MediaCard<'_> {
    fn render(&self) -> Markup {
        let item = self.item;
        let href = format!("/media/{}", item.id);

        html! {
            article class="media-card" {
                a href=(href) {
                    img src=(item.image_url) alt=(item.title) loading="lazy";
                }
                h3 { a href=(href) { (item.title) } }
                @if let Some(description) = &item.description {
                    p class="description" { (description) }
                }
                p class="meta" {
                    span class="author" { "by " (item.author_name) }
                    " · "
                    span class="likes" { (item.likes) " " (plural(item.likes, "like", "likes")) }
                    @if let Some(views) = item.views {
                        " · "
                        span class="views" { (views) " " (plural(views, "view", "views")) }
                    }
                }
            }
        }
    }
}

/// A grid container for media cards.
#[derive(Debug, Clone)]
pub struct MediaGrid<'a> {
    pub items: &'a [&'a MediaItem],
}

impl<'a> MediaGrid<'a> {
    #[must_use]
    pub const fn new(items: &'a [&'a MediaItem]) -> Self {
        Self { items }
    }
}

impl Render for MediaGrid<'_> {
    fn render(&self) -> Markup {
        html! {
            div class="media-grid" {
                @for item in self.items {
                    (MediaCard::new(item))
                }
            }
        }
    }
}

/// Shown instead of the grid when there is nothing to display.
#[derive(Debug, Clone)]
pub struct EmptyState<'a> {
    pub reason: EmptyReason,
    pub query: &'a str,
}

impl<'a> EmptyState<'a> {
    #[must_use]
    pub const fn new(reason: EmptyReason, query: &'a str) -> Self {
        Self { reason, query }
    }
}

impl Render for EmptyState<'_> {
    fn render(&self) -> Markup {
        html! {
            div class="empty-state" {
                @match self.reason {
                    EmptyReason::NoData => {
                        p { "Nothing has been shared yet." }
                        a href="/upload" role="button" { "Upload the first picture" }
                    }
                    EmptyReason::NoMatch => {
                        p { "No results for \u{201c}" (self.query.trim()) "\u{201d}." }
                        a href="/" { "Clear search" }
                    }
                }
            }
        }
    }
}

pub(crate) fn plural<'s>(n: i64, one: &'s str, many: &'s str) -> &'s str {
    if n == 1 {
        one
    } else {
        many
    }
}
