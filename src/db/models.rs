use serde::{Deserialize, Serialize};

/// Author name shown when the uploader's profile can't be resolved.
pub const UNKNOWN_AUTHOR: &str = "unknown";

/// An uploaded image joined with its author's display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub file_path: String,
    pub author_id: String,
    pub author_name: String,
    pub created_at: String,
    pub likes: i64,
    pub views: Option<i64>,
}

/// Data for creating a new media item.
#[derive(Debug, Clone)]
pub struct NewMedia {
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub file_path: String,
    pub author_id: String,
}

/// A comment on a media item.
///
/// `author_name` is copied from the commenter's session when the comment is
/// written and never re-resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub media_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    pub created_at: String,
}

/// Data for creating a new comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub media_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
}

/// A registered user.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A persisted sign-in.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SessionRecord {
    pub token: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
}
