//! Maud HTML template components for the web UI.
//!
//! - `layout`: Base page layout and navigation
//! - `alert`: Inline alerts and the full-view error state
//! - `card`: Media cards, the feed grid and empty states
//! - `form`: Search, upload and comment forms
//! - `media`: Media detail, like button and comment list

pub mod alert;
pub mod card;
pub mod form;
pub mod layout;
pub mod media;

pub use alert::{Alert, AlertVariant, ErrorState};
pub use card::{EmptyState, MediaCard, MediaGrid};
pub use form::{CommentForm, SearchForm, UploadForm};
pub use layout::BaseLayout;
pub use media::{CommentList, LikeButton, MediaDetail};

/// Re-export maud for convenience
pub use maud::{html, Markup, PreEscaped, DOCTYPE};
