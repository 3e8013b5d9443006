//! Form components: feed search, upload and comment forms.

use maud::{html, Markup, Render};

use crate::feed::SortKey;

/// Search box plus sort selector for the feed.
///
/// Submits with GET so the current view is bookmarkable.
#[derive(Debug, Clone)]
pub struct SearchForm<'a> {
    pub query: &'a str,
    pub sort: SortKey,
}

impl<'a> SearchForm<'a> {
    #[must_use]
    pub const fn new(query: &'a str, sort: SortKey) -> Self {
        Self { query, sort }
    }
}

impl Render for SearchForm<'_> {
    fn render(&self) -> Markup {
        html! {
            form method="get" action="/" class="search-form" role="search" {
                input type="search" name="q" value=(self.query)
                    placeholder="Search titles, descriptions and authors"
                    aria-label="Search";
                select name="sort" aria-label="Sort by" {
                    @for key in SortKey::ALL {
                        option value=(key.as_str()) selected[key == self.sort] { (key.label()) }
                    }
                }
                button type="submit" { "Apply" }
            }
        }
    }
}

/// Multipart upload form.
#[derive(Debug, Clone, Default)]
pub struct UploadForm<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub max_size_label: &'a str,
}

impl<'a> UploadForm<'a> {
    #[must_use]
    pub const fn new(max_size_label: &'a str) -> Self {
        Self {
            title: "",
            description: "",
            max_size_label,
        }
    }

    /// Keep what the user typed when the form is shown again after an error.
    #[must_use]
    pub const fn with_values(mut self, title: &'a str, description: &'a str) -> Self {
        self.title = title;
        self.description = description;
        self
    }
}

impl Render for UploadForm<'_> {
    fn render(&self) -> Markup {
        html! {
            form method="post" action="/upload" enctype="multipart/form-data" class="upload-form" {
                label for="title" { "Title" }
                input type="text" id="title" name="title" value=(self.title) required;

                label for="description" { "Description" }
                textarea id="description" name="description" rows="3" { (self.description) }

                label for="file" { "Picture" }
                input type="file" id="file" name="file" accept="image/jpeg,image/png,image/gif,image/webp" required;
                small { "Images only, up to " (self.max_size_label) "." }

                button type="submit" { "Upload" }
            }
        }
    }
}

/// Comment form on the media detail page.
#[derive(Debug, Clone)]
pub struct CommentForm<'a> {
    pub media_id: &'a str,
}

impl<'a> CommentForm<'a> {
    #[must_use]
    pub const fn new(media_id: &'a str) -> Self {
        Self { media_id }
    }
}

impl Render for CommentForm<'_> {
    fn render(&self) -> Markup {
        html! {
            form method="post" action=(format!("/media/{}/comments", self.media_id)) class="comment-form" {
                textarea name="content" rows="2" placeholder="Add a comment" required {}
                button type="submit" { "Post" }
            }
        }
    }
}
