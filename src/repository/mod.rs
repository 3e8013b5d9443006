//! The media repository: the seam between interaction logic and storage.
//!
//! [`SqliteRepository`] is the production backend. [`MemoryRepository`] keeps
//! everything in process, which makes invariants such as "one like per user per
//! item" directly checkable and lets failures be injected.

mod memory;
mod sqlite;

pub use memory::{FailureMode, MemoryRepository};
pub use sqlite::SqliteRepository;

use async_trait::async_trait;

use crate::db::{Comment, MediaItem, NewComment, NewMedia};
use crate::error::{ShareError, ShareResult};
use crate::feed::SortKey;
use crate::likes::LikeKey;

/// Direction of a like count change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeDelta {
    Increment,
    Decrement,
}

impl LikeDelta {
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        match self {
            Self::Increment => 1,
            Self::Decrement => -1,
        }
    }

    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Increment => Self::Decrement,
            Self::Decrement => Self::Increment,
        }
    }

    /// Apply to a count without going below zero.
    #[must_use]
    pub const fn apply(self, count: i64) -> i64 {
        let next = count + self.as_i64();
        if next < 0 {
            0
        } else {
            next
        }
    }
}

#[async_trait]
pub trait MediaRepository: Send + Sync {
    /// List media in the order given by `sort`.
    async fn list_media(&self, sort: SortKey) -> ShareResult<Vec<MediaItem>>;

    /// Look up one item. A miss is `Ok(None)`.
    async fn get_media(&self, id: &str) -> ShareResult<Option<MediaItem>>;

    /// Create a media item. An empty title fails validation before any write.
    async fn create_media(&self, new_media: &NewMedia) -> ShareResult<MediaItem>;

    /// Adjust the stored like count by one and return the stored value.
    ///
    /// This reads the count and writes it back. Two sessions toggling the same
    /// item at once can lose an update; the last writer wins.
    async fn update_like_count(&self, media_id: &str, delta: LikeDelta) -> ShareResult<i64>;

    /// Count one view of an item and return the new total.
    async fn record_view(&self, media_id: &str) -> ShareResult<i64>;

    async fn has_like(&self, key: &LikeKey) -> ShareResult<bool>;

    /// Returns false if the record already existed.
    async fn insert_like(&self, key: &LikeKey) -> ShareResult<bool>;

    /// Returns false if there was no record.
    async fn delete_like(&self, key: &LikeKey) -> ShareResult<bool>;

    /// Comments on an item, newest first.
    async fn list_comments(&self, media_id: &str) -> ShareResult<Vec<Comment>>;

    async fn insert_comment(&self, new_comment: &NewComment) -> ShareResult<Comment>;
}

/// Normalize and check a new media item before it is written.
///
/// # Errors
///
/// Returns [`ShareError::Validation`] for a blank title, image address, or author.
pub fn validate_new_media(new_media: &NewMedia) -> ShareResult<NewMedia> {
    let title = new_media.title.trim();
    if title.is_empty() {
        return Err(ShareError::validation("Title is required"));
    }
    if new_media.image_url.trim().is_empty() {
        return Err(ShareError::validation("Image address is required"));
    }
    if new_media.author_id.trim().is_empty() {
        return Err(ShareError::validation("Author is required"));
    }

    let description = new_media
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);

    Ok(NewMedia {
        title: title.to_string(),
        description,
        image_url: new_media.image_url.clone(),
        file_path: new_media.file_path.clone(),
        author_id: new_media.author_id.clone(),
    })
}
