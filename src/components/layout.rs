//! Base layout components for the web UI.
//!
//! This module provides the page skeleton, navigation and footer.

use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::session::Session;

/// Critical theme initialization script that runs in <head> to prevent flash of wrong theme.
const THEME_INIT_SCRIPT: &str = r#"(function() {
    var theme = localStorage.getItem('theme');
    if (theme) {
        document.documentElement.setAttribute('data-theme', theme);
    } else if (window.matchMedia('(prefers-color-scheme: dark)').matches) {
        document.documentElement.setAttribute('data-theme', 'dark');
    }
})();"#;

/// Base page layout builder.
///
/// The session is required so every page handles the signed-in state
/// explicitly. Pass `None` for anonymous visitors.
///
/// # Example
///
/// ```ignore
/// use maud::html;
/// use crate::components::layout::BaseLayout;
///
/// let content = html! { h1 { "Hello World" } };
/// let page = BaseLayout::new("My Page", session.as_ref()).render(content);
/// ```
#[derive(Debug, Clone)]
pub struct BaseLayout<'a> {
    title: &'a str,
    session: Option<&'a Session>,
}

impl<'a> BaseLayout<'a> {
    #[must_use]
    pub const fn new(title: &'a str, session: Option<&'a Session>) -> Self {
        Self { title, session }
    }

    /// Render the complete HTML page with the given content inside
    /// `<main class="container">`.
    #[must_use]
    pub fn render(self, content: Markup) -> Markup {
        html! {
            (DOCTYPE)
            html lang="en" data-theme="light" {
                head {
                    meta charset="UTF-8";
                    meta name="viewport" content="width=device-width, initial-scale=1.0";
                    meta name="color-scheme" content="light dark";
                    title { (self.title) " - Media Share" }
                    link rel="stylesheet" href="/static/css/style.css";
                    script { (PreEscaped(THEME_INIT_SCRIPT)) }
                }
                body {
                    (self.render_header())
                    main class="container" {
                        (content)
                    }
                    (Self::render_footer())
                }
            }
        }
    }

    fn render_header(&self) -> Markup {
        html! {
            header class="container" {
                nav {
                    ul {
                        li {
                            a href="/" {
                                strong class="site-logo" { "Media Share" }
                            }
                        }
                    }
                    ul {
                        li { a href="/" { "Feed" } }
                        li { a href="/upload" { "Upload" } }
                        (self.render_session_nav())
                    }
                }
            }
        }
    }

    fn render_session_nav(&self) -> Markup {
        match self.session {
            Some(session) => html! {
                li class="signed-in" { "Signed in as " strong { (session.username) } }
            },
            None => html! {
                li class="signed-out" { "Not signed in" }
            },
        }
    }

    fn render_footer() -> Markup {
        html! {
            footer class="container" {
                small { "Media Share" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_layout_basic_structure() {
        let content = html! { h1 { "Test Content" } };
        let html = BaseLayout::new("Test Page", None).render(content).into_string();

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Test Page - Media Share</title>"));
        assert!(html.contains(r#"<main class="container"><h1>Test Content</h1></main>"#));
        assert!(html.contains(r#"<a href="/upload">Upload</a>"#));
        assert!(html.contains("localStorage.getItem('theme')"));
    }

    #[test]
    fn test_base_layout_session_nav() {
        let anonymous = BaseLayout::new("Feed", None)
            .render(html! {})
            .into_string();
        assert!(anonymous.contains("Not signed in"));

        let session = Session::new("u1", "alice_w");
        let signed_in = BaseLayout::new("Feed", Some(&session))
            .render(html! {})
            .into_string();
        assert!(signed_in.contains("<strong>alice_w</strong>"));
        assert!(!signed_in.contains("Not signed in"));
    }
}
