//! Composite key for like records and an in-process set enforcing the
//! one-like-per-user-per-item invariant.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// Identifies a like record: one user liking one media item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LikeKey {
    pub media_id: String,
    pub user_id: String,
}

impl LikeKey {
    #[must_use]
    pub fn new(media_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            user_id: user_id.into(),
        }
    }
}

/// Set of like records keyed by (media, user).
///
/// Presence means "liked". A key can be present at most once, so inserting an
/// existing key or removing a missing one reports `false` and changes nothing.
#[derive(Debug, Clone, Default)]
pub struct LikeSet {
    keys: HashSet<LikeKey>,
}

impl LikeSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the key was newly added.
    pub fn insert(&mut self, key: LikeKey) -> bool {
        self.keys.insert(key)
    }

    /// Returns true if the key was present.
    pub fn remove(&mut self, key: &LikeKey) -> bool {
        self.keys.remove(key)
    }

    #[must_use]
    pub fn contains(&self, key: &LikeKey) -> bool {
        self.keys.contains(key)
    }

    /// Number of users who liked the given item.
    #[must_use]
    pub fn count_for(&self, media_id: &str) -> usize {
        self.keys.iter().filter(|k| k.media_id == media_id).count()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
