//! Maud-based page templates for the web UI.
//!
//! Each page module exports a render function that produces the complete HTML.

pub mod home;
pub mod media;
pub mod upload;

pub use home::{render_error_page, render_home_error, render_home_page, HomePageParams};
pub use media::{render_media_page, render_not_found_page, MediaPageParams};
pub use upload::render_upload_page;
