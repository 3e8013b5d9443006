use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::{validate_new_media, LikeDelta, MediaRepository};
use crate::db::{now_timestamp, Comment, MediaItem, NewComment, NewMedia, UNKNOWN_AUTHOR};
use crate::error::{ShareError, ShareResult};
use crate::feed::SortKey;
use crate::likes::{LikeKey, LikeSet};

/// Which calls an in-memory repository should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureMode {
    #[default]
    None,
    /// Every call fails as if the backend were down.
    Unreachable,
    /// Reads succeed, every write is rejected.
    RejectWrites,
    /// Only `update_like_count` is rejected.
    RejectLikeCount,
}

#[derive(Debug, Default)]
struct State {
    media: Vec<MediaItem>,
    profiles: HashMap<String, String>,
    likes: LikeSet,
    comments: Vec<Comment>,
    failure: FailureMode,
}

/// Media repository held entirely in process memory.
///
/// Items keep insertion order, so ties under a sort key are stable here.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<State>,
    writes: AtomicUsize,
}

impl MemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_failure_mode(&self, mode: FailureMode) {
        self.lock().failure = mode;
    }

    /// Register a username so media joins resolve an author name.
    pub fn add_profile(&self, user_id: &str, username: &str) {
        self.lock()
            .profiles
            .insert(user_id.to_string(), username.to_string());
    }

    /// Insert an item as-is, bypassing validation. Useful for seeding.
    pub fn seed(&self, item: MediaItem) {
        self.lock().media.push(item);
    }

    /// Number of writes that reached the store.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Snapshot of the like records.
    #[must_use]
    pub fn likes(&self) -> LikeSet {
        self.lock().likes.clone()
    }

    /// Number of like records for an item.
    #[must_use]
    pub fn like_records(&self, media_id: &str) -> usize {
        self.lock().likes.count_for(media_id)
    }

    /// Stored like count for an item.
    #[must_use]
    pub fn stored_likes(&self, media_id: &str) -> Option<i64> {
        self.lock()
            .media
            .iter()
            .find(|m| m.id == media_id)
            .map(|m| m.likes)
    }

    fn check_read(state: &State) -> ShareResult<()> {
        match state.failure {
            FailureMode::Unreachable => {
                Err(ShareError::Connectivity("in-memory backend offline".to_string()))
            }
            _ => Ok(()),
        }
    }

    fn check_write(state: &State) -> ShareResult<()> {
        match state.failure {
            FailureMode::Unreachable => {
                Err(ShareError::Connectivity("in-memory backend offline".to_string()))
            }
            FailureMode::RejectWrites => {
                Err(ShareError::Write("in-memory backend rejects writes".to_string()))
            }
            FailureMode::None | FailureMode::RejectLikeCount => Ok(()),
        }
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn resolve_author(state: &State, mut item: MediaItem) -> MediaItem {
        item.author_name = state
            .profiles
            .get(&item.author_id)
            .cloned()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string());
        item
    }
}

#[async_trait]
impl MediaRepository for MemoryRepository {
    async fn list_media(&self, sort: SortKey) -> ShareResult<Vec<MediaItem>> {
        let state = self.lock();
        Self::check_read(&state)?;

        let mut items: Vec<MediaItem> = state
            .media
            .iter()
            .cloned()
            .map(|item| Self::resolve_author(&state, item))
            .collect();

        // Vec::sort_by is stable, so equal keys keep insertion order.
        match sort {
            SortKey::Latest => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            SortKey::Popular => {
                items.sort_by(|a, b| b.views.unwrap_or(0).cmp(&a.views.unwrap_or(0)));
            }
            SortKey::MostLiked => items.sort_by(|a, b| b.likes.cmp(&a.likes)),
        }

        Ok(items)
    }

    async fn get_media(&self, id: &str) -> ShareResult<Option<MediaItem>> {
        let state = self.lock();
        Self::check_read(&state)?;

        Ok(state
            .media
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .map(|item| Self::resolve_author(&state, item)))
    }

    async fn create_media(&self, new_media: &NewMedia) -> ShareResult<MediaItem> {
        let new_media = validate_new_media(new_media)?;
        let mut state = self.lock();
        Self::check_write(&state)?;

        let item = MediaItem {
            id: uuid::Uuid::new_v4().to_string(),
            title: new_media.title,
            description: new_media.description,
            image_url: new_media.image_url,
            file_path: new_media.file_path,
            author_id: new_media.author_id,
            author_name: UNKNOWN_AUTHOR.to_string(),
            created_at: now_timestamp(),
            likes: 0,
            views: None,
        };
        state.media.push(item.clone());
        self.record_write();

        Ok(Self::resolve_author(&state, item))
    }

    async fn update_like_count(&self, media_id: &str, delta: LikeDelta) -> ShareResult<i64> {
        let mut state = self.lock();
        Self::check_write(&state)?;
        if state.failure == FailureMode::RejectLikeCount {
            return Err(ShareError::Write("like count update rejected".to_string()));
        }

        let item = state
            .media
            .iter_mut()
            .find(|m| m.id == media_id)
            .ok_or_else(|| ShareError::NotFound(format!("media {media_id}")))?;
        item.likes = delta.apply(item.likes);
        let likes = item.likes;
        self.record_write();

        Ok(likes)
    }

    async fn record_view(&self, media_id: &str) -> ShareResult<i64> {
        let mut state = self.lock();
        Self::check_write(&state)?;

        let item = state
            .media
            .iter_mut()
            .find(|m| m.id == media_id)
            .ok_or_else(|| ShareError::NotFound(format!("media {media_id}")))?;
        let views = item.views.unwrap_or(0) + 1;
        item.views = Some(views);
        self.record_write();

        Ok(views)
    }

    async fn has_like(&self, key: &LikeKey) -> ShareResult<bool> {
        let state = self.lock();
        Self::check_read(&state)?;
        Ok(state.likes.contains(key))
    }

    async fn insert_like(&self, key: &LikeKey) -> ShareResult<bool> {
        let mut state = self.lock();
        Self::check_write(&state)?;
        self.record_write();
        Ok(state.likes.insert(key.clone()))
    }

    async fn delete_like(&self, key: &LikeKey) -> ShareResult<bool> {
        let mut state = self.lock();
        Self::check_write(&state)?;
        self.record_write();
        Ok(state.likes.remove(key))
    }

    async fn list_comments(&self, media_id: &str) -> ShareResult<Vec<Comment>> {
        let state = self.lock();
        Self::check_read(&state)?;

        let mut comments: Vec<Comment> = state
            .comments
            .iter()
            .filter(|c| c.media_id == media_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(comments)
    }

    async fn insert_comment(&self, new_comment: &NewComment) -> ShareResult<Comment> {
        let mut state = self.lock();
        Self::check_write(&state)?;

        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            media_id: new_comment.media_id.clone(),
            author_id: new_comment.author_id.clone(),
            author_name: new_comment.author_name.clone(),
            content: new_comment.content.clone(),
            created_at: now_timestamp(),
        };
        state.comments.push(comment.clone());
        self.record_write();

        Ok(comment)
    }
}
