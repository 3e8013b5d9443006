use anyhow::{Context, Result};
use sqlx::SqlitePool;

use super::models::{Comment, MediaItem, NewComment, NewMedia, Profile, SessionRecord};
use super::now_timestamp;
use crate::feed::SortKey;
use crate::likes::LikeKey;

/// Media columns joined with the author's username.
const MEDIA_SELECT: &str = r"
    SELECT
        m.id, m.title, m.description, m.image_url, m.file_path, m.author_id,
        COALESCE(p.username, 'unknown') as author_name,
        m.created_at, m.likes, m.views
    FROM media m
    LEFT JOIN profiles p ON m.author_id = p.id
";

/// ORDER BY clause for a feed sort key.
///
/// Ties fall back to whatever order SQLite produces.
const fn order_clause(sort: SortKey) -> &'static str {
    match sort {
        SortKey::Latest => "ORDER BY m.created_at DESC",
        SortKey::Popular => "ORDER BY COALESCE(m.views, 0) DESC",
        SortKey::MostLiked => "ORDER BY m.likes DESC",
    }
}

// ========== Media ==========

/// List media items in the order requested by the feed.
pub async fn list_media(pool: &SqlitePool, sort: SortKey, limit: i64) -> Result<Vec<MediaItem>> {
    let sql = format!("{MEDIA_SELECT} {} LIMIT ?", order_clause(sort));
    sqlx::query_as(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await
        .with_context(|| format!("Failed to list media sorted by {}", sort.as_str()))
}

/// Get a media item by id.
pub async fn get_media(pool: &SqlitePool, id: &str) -> Result<Option<MediaItem>> {
    let sql = format!("{MEDIA_SELECT} WHERE m.id = ?");
    sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to fetch media item")
}

/// Insert a media item with an explicit id and creation time.
pub async fn insert_media(
    pool: &SqlitePool,
    id: &str,
    new_media: &NewMedia,
    created_at: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO media (id, title, description, image_url, file_path, author_id, likes, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 0, ?)
        ",
    )
    .bind(id)
    .bind(&new_media.title)
    .bind(&new_media.description)
    .bind(&new_media.image_url)
    .bind(&new_media.file_path)
    .bind(&new_media.author_id)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert media item")?;

    Ok(())
}

/// Get the stored like count for a media item.
pub async fn get_like_count(pool: &SqlitePool, media_id: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as("SELECT likes FROM media WHERE id = ?")
        .bind(media_id)
        .fetch_optional(pool)
        .await
        .context("Failed to read like count")?;

    Ok(row.map(|(likes,)| likes))
}

/// Overwrite the stored like count.
pub async fn set_like_count(pool: &SqlitePool, media_id: &str, likes: i64) -> Result<()> {
    sqlx::query("UPDATE media SET likes = ? WHERE id = ?")
        .bind(likes.max(0))
        .bind(media_id)
        .execute(pool)
        .await
        .context("Failed to update like count")?;

    Ok(())
}

/// Set a media item's view count directly.
pub async fn set_views(pool: &SqlitePool, media_id: &str, views: i64) -> Result<()> {
    sqlx::query("UPDATE media SET views = ? WHERE id = ?")
        .bind(views)
        .bind(media_id)
        .execute(pool)
        .await
        .context("Failed to set view count")?;

    Ok(())
}

/// Increment a media item's view count, returning the new value.
pub async fn increment_views(pool: &SqlitePool, media_id: &str) -> Result<Option<i64>> {
    let row: Option<(i64,)> = sqlx::query_as(
        "UPDATE media SET views = COALESCE(views, 0) + 1 WHERE id = ? RETURNING views",
    )
    .bind(media_id)
    .fetch_optional(pool)
    .await
    .context("Failed to record view")?;

    Ok(row.map(|(views,)| views))
}

// ========== Likes ==========

/// Check whether a like record exists.
pub async fn like_exists(pool: &SqlitePool, key: &LikeKey) -> Result<bool> {
    let row: Option<(i64,)> =
        sqlx::query_as("SELECT 1 FROM likes WHERE media_id = ? AND user_id = ?")
            .bind(&key.media_id)
            .bind(&key.user_id)
            .fetch_optional(pool)
            .await
            .context("Failed to check like status")?;

    Ok(row.is_some())
}

/// Insert a like record. Returns false if it already existed.
pub async fn insert_like(pool: &SqlitePool, key: &LikeKey) -> Result<bool> {
    let result = sqlx::query(
        r"
        INSERT OR IGNORE INTO likes (media_id, user_id, created_at)
        VALUES (?, ?, ?)
        ",
    )
    .bind(&key.media_id)
    .bind(&key.user_id)
    .bind(now_timestamp())
    .execute(pool)
    .await
    .context("Failed to insert like")?;

    Ok(result.rows_affected() > 0)
}

/// Delete a like record. Returns false if there was nothing to delete.
pub async fn delete_like(pool: &SqlitePool, key: &LikeKey) -> Result<bool> {
    let result = sqlx::query("DELETE FROM likes WHERE media_id = ? AND user_id = ?")
        .bind(&key.media_id)
        .bind(&key.user_id)
        .execute(pool)
        .await
        .context("Failed to delete like")?;

    Ok(result.rows_affected() > 0)
}

/// Count like records for a media item.
pub async fn count_likes(pool: &SqlitePool, media_id: &str) -> Result<i64> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM likes WHERE media_id = ?")
        .bind(media_id)
        .fetch_one(pool)
        .await
        .context("Failed to count likes")?;

    Ok(count.0)
}

// ========== Comments ==========

/// Get comments for a media item, newest first.
pub async fn list_comments(pool: &SqlitePool, media_id: &str) -> Result<Vec<Comment>> {
    sqlx::query_as(
        r"
        SELECT id, media_id, author_id, author_name, content, created_at
        FROM comments
        WHERE media_id = ?
        ORDER BY created_at DESC
        ",
    )
    .bind(media_id)
    .fetch_all(pool)
    .await
    .context("Failed to list comments")
}

/// Insert a comment with an explicit id and creation time.
pub async fn insert_comment(
    pool: &SqlitePool,
    id: &str,
    new_comment: &NewComment,
    created_at: &str,
) -> Result<()> {
    sqlx::query(
        r"
        INSERT INTO comments (id, media_id, author_id, author_name, content, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(id)
    .bind(&new_comment.media_id)
    .bind(&new_comment.author_id)
    .bind(&new_comment.author_name)
    .bind(&new_comment.content)
    .bind(created_at)
    .execute(pool)
    .await
    .context("Failed to insert comment")?;

    Ok(())
}

// ========== Profiles ==========

/// Create a new profile.
pub async fn create_profile(
    pool: &SqlitePool,
    id: &str,
    username: &str,
    email: Option<&str>,
    password_hash: &str,
) -> Result<()> {
    let now = now_timestamp();
    sqlx::query(
        r"
        INSERT INTO profiles (id, username, email, password_hash, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ",
    )
    .bind(id)
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .context("Failed to create profile")?;

    Ok(())
}

/// Get a profile by id.
pub async fn get_profile(pool: &SqlitePool, id: &str) -> Result<Option<Profile>> {
    sqlx::query_as(
        r"
        SELECT id, username, email, password_hash, avatar_url, created_at, updated_at
        FROM profiles WHERE id = ?
        ",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch profile")
}

/// Get a profile by username or email (users can sign in with either).
pub async fn get_profile_by_login(pool: &SqlitePool, login: &str) -> Result<Option<Profile>> {
    sqlx::query_as(
        r"
        SELECT id, username, email, password_hash, avatar_url, created_at, updated_at
        FROM profiles WHERE username = ? COLLATE NOCASE OR email = ? COLLATE NOCASE
        LIMIT 1
        ",
    )
    .bind(login)
    .bind(login)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch profile by login")
}

/// Check whether a username or email is already registered.
pub async fn profile_exists(pool: &SqlitePool, username: &str, email: Option<&str>) -> Result<bool> {
    let row: Option<(i64,)> = sqlx::query_as(
        r"
        SELECT 1 FROM profiles
        WHERE username = ? COLLATE NOCASE OR (? IS NOT NULL AND email = ? COLLATE NOCASE)
        LIMIT 1
        ",
    )
    .bind(username)
    .bind(email)
    .bind(email)
    .fetch_optional(pool)
    .await
    .context("Failed to check for existing profile")?;

    Ok(row.is_some())
}

// ========== Sessions ==========

/// Persist a session token.
pub async fn create_session(
    pool: &SqlitePool,
    token: &str,
    user_id: &str,
    expires_at: &str,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token)
    .bind(user_id)
    .bind(now_timestamp())
    .bind(expires_at)
    .execute(pool)
    .await
    .context("Failed to create session")?;

    Ok(())
}

/// Look up a session by token.
pub async fn get_session_by_token(pool: &SqlitePool, token: &str) -> Result<Option<SessionRecord>> {
    sqlx::query_as(
        "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = ?",
    )
    .bind(token)
    .fetch_optional(pool)
    .await
    .context("Failed to fetch session")
}

/// Delete a session (sign-out).
pub async fn delete_session(pool: &SqlitePool, token: &str) -> Result<()> {
    sqlx::query("DELETE FROM sessions WHERE token = ?")
        .bind(token)
        .execute(pool)
        .await
        .context("Failed to delete session")?;

    Ok(())
}
