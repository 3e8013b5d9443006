use maud::{html, Markup};

use crate::components::{Alert, BaseLayout, UploadForm};
use crate::session::Session;

/// Render the upload page, optionally with an inline error and the values
/// the user already entered.
#[must_use]
pub fn render_upload_page(
    session: Option<&Session>,
    max_size_label: &str,
    error: Option<&str>,
    values: (&str, &str),
) -> Markup {
    let content = html! {
        h1 { "Share a picture" }
        @if let Some(error) = error {
            (Alert::error(error))
        }
        @if session.is_some() {
            (UploadForm::new(max_size_label).with_values(values.0, values.1))
        } @else {
            (Alert::info("Sign in to upload pictures."))
        }
    };
    BaseLayout::new("Upload", session).render(content)
}
