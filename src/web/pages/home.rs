//! Feed page.

use maud::{html, Markup};
use urlencoding::encode;

use crate::components::{Alert, BaseLayout, EmptyState, ErrorState, MediaGrid, SearchForm};
use crate::error::ShareError;
use crate::feed::{FeedView, SortKey};
use crate::session::Session;

/// Parameters for the feed page.
#[derive(Debug)]
pub struct HomePageParams<'a> {
    pub view: FeedView<'a>,
    pub session: Option<&'a Session>,
    /// Flash message from a redirect (e.g. after an upload).
    pub notice: Option<&'a str>,
}

/// Render the feed page.
#[must_use]
pub fn render_home_page(params: &HomePageParams<'_>) -> Markup {
    let view = &params.view;

    let content = html! {
        h1 { "Feed" }
        @if let Some(notice) = params.notice {
            (Alert::success(notice))
        }
        (SearchForm::new(view.query, view.sort))
        @if let Some(reason) = view.empty_reason() {
            (EmptyState::new(reason, view.query))
        } @else {
            @if !view.query.trim().is_empty() {
                p class="result-count" {
                    (view.items.len()) " of " (view.total) " items match"
                }
            }
            (MediaGrid::new(&view.items))
        }
    };

    BaseLayout::new("Feed", params.session).render(content)
}

/// Render the full-view error state in place of the feed.
///
/// The reload link keeps the current sort and search.
#[must_use]
pub fn render_home_error(
    err: &ShareError,
    sort: SortKey,
    query: &str,
    session: Option<&Session>,
) -> Markup {
    let retry = format!("/?sort={}&q={}", sort.as_str(), encode(query));
    render_error_page(err, &retry, session)
}

/// Full-view error state for any page.
#[must_use]
pub fn render_error_page(err: &ShareError, retry_href: &str, session: Option<&Session>) -> Markup {
    let content = html! {
        (ErrorState::from_error(err, retry_href))
    };
    BaseLayout::new("Error", session).render(content)
}
