use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::debug;

use super::{validate_new_media, LikeDelta, MediaRepository};
use crate::db::{self, now_timestamp, Comment, Database, MediaItem, NewComment, NewMedia};
use crate::error::{with_deadline, Access, ShareError, ShareResult};
use crate::feed::SortKey;
use crate::likes::LikeKey;

/// Media repository backed by the SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteRepository {
    db: Database,
    timeout: Duration,
    feed_limit: i64,
}

impl SqliteRepository {
    #[must_use]
    pub const fn new(db: Database, timeout: Duration, feed_limit: i64) -> Self {
        Self {
            db,
            timeout,
            feed_limit,
        }
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl MediaRepository for SqliteRepository {
    async fn list_media(&self, sort: SortKey) -> ShareResult<Vec<MediaItem>> {
        with_deadline(
            self.timeout,
            Access::Read,
            db::list_media(self.db.pool(), sort, self.feed_limit),
        )
        .await
    }

    async fn get_media(&self, id: &str) -> ShareResult<Option<MediaItem>> {
        with_deadline(self.timeout, Access::Read, db::get_media(self.db.pool(), id)).await
    }

    async fn create_media(&self, new_media: &NewMedia) -> ShareResult<MediaItem> {
        let new_media = validate_new_media(new_media)?;
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = now_timestamp();
        let pool = self.db.pool();

        with_deadline(self.timeout, Access::Write, async {
            db::insert_media(pool, &id, &new_media, &created_at).await?;
            db::get_media(pool, &id)
                .await?
                .ok_or_else(|| anyhow!("Media item {id} vanished after insert"))
        })
        .await
    }

    async fn update_like_count(&self, media_id: &str, delta: LikeDelta) -> ShareResult<i64> {
        let pool = self.db.pool();
        let updated = with_deadline(self.timeout, Access::Write, async {
            let Some(current) = db::get_like_count(pool, media_id).await? else {
                return Ok(None);
            };
            let next = delta.apply(current);
            db::set_like_count(pool, media_id, next).await?;
            Ok::<_, anyhow::Error>(Some(next))
        })
        .await?;

        debug!(media_id, delta = delta.as_i64(), likes = ?updated, "Updated like count");
        updated.ok_or_else(|| ShareError::NotFound(format!("media {media_id}")))
    }

    async fn record_view(&self, media_id: &str) -> ShareResult<i64> {
        with_deadline(
            self.timeout,
            Access::Write,
            db::increment_views(self.db.pool(), media_id),
        )
        .await?
        .ok_or_else(|| ShareError::NotFound(format!("media {media_id}")))
    }

    async fn has_like(&self, key: &LikeKey) -> ShareResult<bool> {
        with_deadline(self.timeout, Access::Read, db::like_exists(self.db.pool(), key)).await
    }

    async fn insert_like(&self, key: &LikeKey) -> ShareResult<bool> {
        with_deadline(self.timeout, Access::Write, db::insert_like(self.db.pool(), key)).await
    }

    async fn delete_like(&self, key: &LikeKey) -> ShareResult<bool> {
        with_deadline(self.timeout, Access::Write, db::delete_like(self.db.pool(), key)).await
    }

    async fn list_comments(&self, media_id: &str) -> ShareResult<Vec<Comment>> {
        with_deadline(
            self.timeout,
            Access::Read,
            db::list_comments(self.db.pool(), media_id),
        )
        .await
    }

    async fn insert_comment(&self, new_comment: &NewComment) -> ShareResult<Comment> {
        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            media_id: new_comment.media_id.clone(),
            author_id: new_comment.author_id.clone(),
            author_name: new_comment.author_name.clone(),
            content: new_comment.content.clone(),
            created_at: now_timestamp(),
        };

        with_deadline(
            self.timeout,
            Access::Write,
            db::insert_comment(self.db.pool(), &comment.id, new_comment, &comment.created_at),
        )
        .await?;

        Ok(comment)
    }
}
