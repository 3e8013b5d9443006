//! Likes and comments.
//!
//! A like toggle is applied to the local view first, then written to the
//! repository. If the write is confirmed the local count is replaced by the
//! stored count; if it fails the local state is restored and the reason is
//! handed back to the caller.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::db::{Comment, NewComment};
use crate::error::{ShareError, ShareResult};
use crate::likes::LikeKey;
use crate::repository::{LikeDelta, MediaRepository};
use crate::session::Session;

/// Like status of one user for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LikeState {
    Liked,
    NotLiked,
}

impl LikeState {
    #[must_use]
    pub const fn is_liked(self) -> bool {
        matches!(self, Self::Liked)
    }

    #[must_use]
    pub const fn flipped(self) -> Self {
        match self {
            Self::Liked => Self::NotLiked,
            Self::NotLiked => Self::Liked,
        }
    }
}

/// Result of a toggle after the backend answered.
#[derive(Debug)]
pub enum ToggleOutcome {
    /// The backend accepted the change. `count` is the stored count.
    Confirmed { state: LikeState, count: i64 },
    /// The backend failed; state and count are back to what they were.
    RevertedWithReason {
        state: LikeState,
        count: i64,
        reason: ShareError,
    },
}

impl ToggleOutcome {
    #[must_use]
    pub const fn state(&self) -> LikeState {
        match self {
            Self::Confirmed { state, .. } | Self::RevertedWithReason { state, .. } => *state,
        }
    }

    #[must_use]
    pub const fn count(&self) -> i64 {
        match self {
            Self::Confirmed { count, .. } | Self::RevertedWithReason { count, .. } => *count,
        }
    }

    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed { .. })
    }
}

/// Local view of the like button for one (media, user) pair.
#[derive(Debug, Clone)]
pub struct LikeControl {
    key: LikeKey,
    state: LikeState,
    count: i64,
}

impl LikeControl {
    /// Build a control in a known state, without asking the backend.
    #[must_use]
    pub fn new(key: LikeKey, state: LikeState, count: i64) -> Self {
        Self {
            key,
            state,
            count: count.max(0),
        }
    }

    /// Resolve the initial state from the like records.
    ///
    /// A failed lookup is logged and treated as not liked.
    pub async fn resolve<R>(repo: &R, session: &Session, media_id: &str, count: i64) -> Self
    where
        R: MediaRepository + ?Sized,
    {
        let key = LikeKey::new(media_id, session.user_id.as_str());
        let state = match repo.has_like(&key).await {
            Ok(true) => LikeState::Liked,
            Ok(false) => LikeState::NotLiked,
            Err(e) => {
                warn!(media_id, user_id = %session.user_id, error = %e, "Failed to check like status");
                LikeState::NotLiked
            }
        };
        Self::new(key, state, count)
    }

    #[must_use]
    pub const fn state(&self) -> LikeState {
        self.state
    }

    #[must_use]
    pub const fn count(&self) -> i64 {
        self.count
    }

    #[must_use]
    pub const fn key(&self) -> &LikeKey {
        &self.key
    }

    /// Flip the like state.
    ///
    /// The local state and count change before the backend is asked. The
    /// like record is written first, then the stored count is adjusted. If
    /// the record was already in the target state (another device got there
    /// first) the count is left alone and re-read. If the count update fails
    /// after the record changed, the record change is undone (best effort)
    /// and the local state is restored.
    pub async fn toggle<R>(&mut self, repo: &R) -> ToggleOutcome
    where
        R: MediaRepository + ?Sized,
    {
        let previous = (self.state, self.count);
        let delta = match self.state {
            LikeState::NotLiked => LikeDelta::Increment,
            LikeState::Liked => LikeDelta::Decrement,
        };

        // Phase one: local.
        self.state = self.state.flipped();
        self.count = delta.apply(self.count);
        debug!(
            media_id = %self.key.media_id,
            user_id = %self.key.user_id,
            state = ?self.state,
            count = self.count,
            "Applied like toggle locally"
        );

        // Phase two: backend.
        let changed = match write_record(repo, &self.key, delta).await {
            Ok(changed) => changed,
            Err(reason) => return self.revert(previous, reason),
        };

        if !changed {
            return self.reconcile_unchanged(repo, previous).await;
        }

        match repo.update_like_count(&self.key.media_id, delta).await {
            Ok(stored) => {
                self.count = stored;
                info!(
                    media_id = %self.key.media_id,
                    user_id = %self.key.user_id,
                    liked = self.state.is_liked(),
                    likes = stored,
                    "Like toggle confirmed"
                );
                ToggleOutcome::Confirmed {
                    state: self.state,
                    count: stored,
                }
            }
            Err(reason) => {
                if let Err(e) = write_record(repo, &self.key, delta.inverse()).await {
                    error!(
                        media_id = %self.key.media_id,
                        user_id = %self.key.user_id,
                        error = %e,
                        "Failed to undo like record after count update failed"
                    );
                }
                self.revert(previous, reason)
            }
        }
    }

    /// The record already matched the new state, so the stored count already
    /// accounts for it. Take the stored count as is.
    async fn reconcile_unchanged<R>(&mut self, repo: &R, previous: (LikeState, i64)) -> ToggleOutcome
    where
        R: MediaRepository + ?Sized,
    {
        match repo.get_media(&self.key.media_id).await {
            Ok(Some(item)) => self.count = item.likes,
            Ok(None) => {
                return self.revert(
                    previous,
                    ShareError::NotFound(format!("media {}", self.key.media_id)),
                );
            }
            Err(e) => {
                warn!(media_id = %self.key.media_id, error = %e, "Failed to re-read like count");
                self.count = previous.1;
            }
        }
        debug!(
            media_id = %self.key.media_id,
            user_id = %self.key.user_id,
            liked = self.state.is_liked(),
            likes = self.count,
            "Like record already up to date"
        );
        ToggleOutcome::Confirmed {
            state: self.state,
            count: self.count,
        }
    }

    fn revert(&mut self, previous: (LikeState, i64), reason: ShareError) -> ToggleOutcome {
        (self.state, self.count) = previous;
        warn!(
            media_id = %self.key.media_id,
            user_id = %self.key.user_id,
            error = %reason,
            "Like toggle reverted"
        );
        ToggleOutcome::RevertedWithReason {
            state: self.state,
            count: self.count,
            reason,
        }
    }
}

/// Insert the like record for an increment, delete it for a decrement.
/// Returns whether the record changed.
async fn write_record<R>(repo: &R, key: &LikeKey, delta: LikeDelta) -> ShareResult<bool>
where
    R: MediaRepository + ?Sized,
{
    match delta {
        LikeDelta::Increment => repo.insert_like(key).await,
        LikeDelta::Decrement => repo.delete_like(key).await,
    }
}

/// Tracks like toggles that are waiting on the backend.
///
/// Only one toggle per (media, user) may be pending at a time; this is the
/// only guard against double submits.
#[derive(Debug, Clone, Default)]
pub struct InFlightRegistry {
    pending: Arc<Mutex<HashSet<LikeKey>>>,
}

impl InFlightRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the key. Returns `None` if a toggle for it is already pending.
    #[must_use]
    pub fn try_acquire(&self, key: &LikeKey) -> Option<InFlightGuard> {
        let mut pending = self.pending.lock().unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(key.clone()) {
            return None;
        }
        Some(InFlightGuard {
            key: key.clone(),
            pending: Arc::clone(&self.pending),
        })
    }

    #[must_use]
    pub fn is_pending(&self, key: &LikeKey) -> bool {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }
}

/// Releases its key when dropped.
#[derive(Debug)]
pub struct InFlightGuard {
    key: LikeKey,
    pending: Arc<Mutex<HashSet<LikeKey>>>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Comments on one media item as held by a view, newest first.
#[derive(Debug, Clone)]
pub struct CommentThread {
    media_id: String,
    comments: Vec<Comment>,
}

impl CommentThread {
    #[must_use]
    pub fn new(media_id: impl Into<String>, comments: Vec<Comment>) -> Self {
        Self {
            media_id: media_id.into(),
            comments,
        }
    }

    /// Load the thread from the repository.
    ///
    /// # Errors
    ///
    /// Propagates repository failures.
    pub async fn load<R>(repo: &R, media_id: &str) -> ShareResult<Self>
    where
        R: MediaRepository + ?Sized,
    {
        let comments = repo.list_comments(media_id).await?;
        Ok(Self::new(media_id, comments))
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    #[must_use]
    pub fn media_id(&self) -> &str {
        &self.media_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    /// Append a comment as the session's user.
    ///
    /// The body is trimmed. The new comment goes to the front of the local
    /// list; nothing is re-fetched.
    ///
    /// # Errors
    ///
    /// [`ShareError::Validation`] for an empty or whitespace-only body (no
    /// write is issued), or the repository's error.
    pub async fn add<R>(&mut self, repo: &R, session: &Session, body: &str) -> ShareResult<&Comment>
    where
        R: MediaRepository + ?Sized,
    {
        let comment = add_comment(repo, &self.media_id, body, session).await?;
        self.comments.insert(0, comment);
        Ok(&self.comments[0])
    }
}

/// Write a comment on a media item.
///
/// # Errors
///
/// [`ShareError::Validation`] for an empty or whitespace-only body, or the
/// repository's error.
pub async fn add_comment<R>(
    repo: &R,
    media_id: &str,
    body: &str,
    session: &Session,
) -> ShareResult<Comment>
where
    R: MediaRepository + ?Sized,
{
    let content = body.trim();
    if content.is_empty() {
        return Err(ShareError::validation("Comment cannot be empty"));
    }

    let new_comment = NewComment {
        media_id: media_id.to_string(),
        author_id: session.user_id.clone(),
        author_name: session.author_name(),
        content: content.to_string(),
    };

    let comment = repo.insert_comment(&new_comment).await?;
    info!(media_id, comment_id = %comment.id, user_id = %session.user_id, "Comment added");
    Ok(comment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MediaItem;
    use crate::repository::{FailureMode, MemoryRepository};

    fn seeded(likes: i64) -> MemoryRepository {
        let repo = MemoryRepository::new();
        repo.add_profile("author", "author");
        repo.seed(MediaItem {
            id: "m1".to_string(),
            title: "Lighthouse".to_string(),
            description: None,
            image_url: "https://cdn.example.com/author/l.png".to_string(),
            file_path: "author/l.png".to_string(),
            author_id: "author".to_string(),
            author_name: "author".to_string(),
            created_at: "2024-01-01T00:00:00.000000Z".to_string(),
            likes,
            views: None,
        });
        repo
    }

    fn viewer() -> Session {
        Session::new("viewer", "viewer").with_email("viewer@example.com")
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let repo = seeded(4);
        let mut control = LikeControl::resolve(&repo, &viewer(), "m1", 4).await;
        assert_eq!(control.state(), LikeState::NotLiked);

        let first = control.toggle(&repo).await;
        assert!(first.is_confirmed());
        assert_eq!(first.state(), LikeState::Liked);
        assert_eq!(first.count(), 5);

        let second = control.toggle(&repo).await;
        assert!(second.is_confirmed());
        assert_eq!(control.state(), LikeState::NotLiked);
        assert_eq!(control.count(), 4);
        assert_eq!(repo.stored_likes("m1"), Some(4));
        assert!(repo.likes().is_empty());
    }

    #[tokio::test]
    async fn test_failed_record_write_reverts() {
        let repo = seeded(2);
        let mut control = LikeControl::resolve(&repo, &viewer(), "m1", 2).await;
        repo.set_failure_mode(FailureMode::RejectWrites);

        let outcome = control.toggle(&repo).await;
        assert!(matches!(
            outcome,
            ToggleOutcome::RevertedWithReason {
                state: LikeState::NotLiked,
                count: 2,
                reason: ShareError::Write(_),
            }
        ));
        assert_eq!(control.state(), LikeState::NotLiked);
        assert_eq!(control.count(), 2);
    }

    #[tokio::test]
    async fn test_failed_count_update_undoes_record() {
        let repo = seeded(2);
        let mut control = LikeControl::resolve(&repo, &viewer(), "m1", 2).await;
        repo.set_failure_mode(FailureMode::RejectLikeCount);

        let outcome = control.toggle(&repo).await;
        assert!(!outcome.is_confirmed());
        assert_eq!(control.state(), LikeState::NotLiked);
        assert!(!repo.likes().contains(control.key()));
        assert_eq!(repo.stored_likes("m1"), Some(2));
    }

    #[tokio::test]
    async fn test_resolve_fails_open() {
        let repo = seeded(0);
        repo.set_failure_mode(FailureMode::Unreachable);
        let control = LikeControl::resolve(&repo, &viewer(), "m1", 7).await;
        assert_eq!(control.state(), LikeState::NotLiked);
        assert_eq!(control.count(), 7);
    }

    #[test]
    fn test_in_flight_guard_blocks_second_toggle() {
        let registry = InFlightRegistry::new();
        let key = LikeKey::new("m1", "viewer");

        let guard = registry.try_acquire(&key).expect("first acquire");
        assert!(registry.try_acquire(&key).is_none());
        assert!(registry.is_pending(&key));

        // Other pairs are independent.
        assert!(registry.try_acquire(&LikeKey::new("m2", "viewer")).is_some());

        drop(guard);
        assert!(!registry.is_pending(&key));
        assert!(registry.try_acquire(&key).is_some());
    }

    #[tokio::test]
    async fn test_whitespace_comment_rejected_without_write() {
        let repo = seeded(0);
        let mut thread = CommentThread::load(&repo, "m1").await.unwrap();
        let writes = repo.write_count();

        let err = thread.add(&repo, &viewer(), "  ").await.unwrap_err();
        assert!(matches!(err, ShareError::Validation(_)));
        assert_eq!(repo.write_count(), writes);
        assert!(thread.is_empty());
    }

    #[tokio::test]
    async fn test_new_comment_goes_first() {
        let repo = seeded(0);
        let mut thread = CommentThread::load(&repo, "m1").await.unwrap();
        thread.add(&repo, &viewer(), "first").await.unwrap();

        let added = thread.add(&repo, &viewer(), "  nice!  ").await.unwrap();
        assert_eq!(added.content, "nice!");
        assert_eq!(added.author_name, "viewer");

        assert_eq!(thread.len(), 2);
        assert_eq!(thread.comments()[0].content, "nice!");
        assert_eq!(thread.comments()[1].content, "first");
    }
}
