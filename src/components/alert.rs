//! Alert and error-state components.

use maud::{html, Markup, Render};

use crate::error::ShareError;

/// Alert variant types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertVariant {
    Success,
    Error,
    Info,
}

impl AlertVariant {
    /// CSS class for the alert article element.
    #[must_use]
    pub const fn article_class(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Info => "info",
        }
    }
}

/// An inline alert message.
///
/// # Example
///
/// ```ignore
/// use crate::components::alert::Alert;
///
/// let alert = Alert::error("Comment cannot be empty");
/// ```
#[derive(Debug, Clone)]
pub struct Alert<'a> {
    pub variant: AlertVariant,
    pub message: &'a str,
}

impl<'a> Alert<'a> {
    #[must_use]
    pub const fn new(variant: AlertVariant, message: &'a str) -> Self {
        Self { variant, message }
    }

    #[must_use]
    pub const fn success(message: &'a str) -> Self {
        Self::new(AlertVariant::Success, message)
    }

    #[must_use]
    pub const fn error(message: &'a str) -> Self {
        Self::new(AlertVariant::Error, message)
    }

    #[must_use]
    pub const fn info(message: &'a str) -> Self {
        Self::new(AlertVariant::Info, message)
    }
}

impl Render for Alert<'_> {
    fn render(&self) -> Markup {
        html! {
            article class=(self.variant.article_class()) role="alert" {
                (self.message)
            }
        }
    }
}

/// Full-view error state, shown in place of the page content when the
/// backend can't be reached.
#[derive(Debug, Clone)]
pub struct ErrorState {
    pub message: String,
    pub retry_href: String,
}

impl ErrorState {
    #[must_use]
    pub fn new(message: impl Into<String>, retry_href: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            retry_href: retry_href.into(),
        }
    }

    #[must_use]
    pub fn from_error(err: &ShareError, retry_href: impl Into<String>) -> Self {
        Self::new(err.user_message(), retry_href)
    }
}

impl Render for ErrorState {
    fn render(&self) -> Markup {
        html! {
            section class="error-state" {
                h2 { "Something went wrong" }
                p { (self.message) }
                a href=(self.retry_href) role="button" { "Reload" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_variants() {
        let html = Alert::error("Nope").render().into_string();
        assert_eq!(html, r#"<article class="error" role="alert">Nope</article>"#);
        assert!(Alert::success("Saved").render().into_string().contains(r#"class="success""#));
    }

    #[test]
    fn test_alert_escapes_message() {
        let html = Alert::info("<b>bold</b>").render().into_string();
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
    }

    #[test]
    fn test_error_state_hides_backend_detail() {
        let err = ShareError::Connectivity("pool timed out at 10.0.0.3".to_string());
        let html = ErrorState::from_error(&err, "/?sort=latest").render().into_string();
        assert!(html.contains("unreachable"));
        assert!(!html.contains("10.0.0.3"));
        assert!(html.contains(r#"href="/?sort=latest""#));
    }
}
