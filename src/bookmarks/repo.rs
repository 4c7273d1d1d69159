use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::write_error;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub post_id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

#[async_trait]
pub trait BookmarkStore: Send + Sync {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Bookmark>>;
    async fn find(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<Option<Bookmark>>;
    async fn insert(&self, bookmark: Bookmark) -> anyhow::Result<Bookmark>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

pub struct PgBookmarkStore {
    db: PgPool,
}

impl PgBookmarkStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BookmarkStore for PgBookmarkStore {
    async fn list_by_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Bookmark>> {
        let rows = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, post_id, created_at
              FROM bookmarks
             WHERE user_id = $1
             ORDER BY created_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .context("list bookmarks")?;
        Ok(rows)
    }

    async fn find(&self, user_id: Uuid, post_id: Uuid) -> anyhow::Result<Option<Bookmark>> {
        let row = sqlx::query_as::<_, Bookmark>(
            r#"
            SELECT id, user_id, post_id, created_at
              FROM bookmarks
             WHERE user_id = $1 AND post_id = $2
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.db)
        .await
        .context("find bookmark")?;
        Ok(row)
    }

    async fn insert(&self, b: Bookmark) -> anyhow::Result<Bookmark> {
        let row = sqlx::query_as::<_, Bookmark>(
            r#"
            INSERT INTO bookmarks (id, user_id, post_id, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, post_id, created_at
            "#,
        )
        .bind(b.id)
        .bind(b.user_id)
        .bind(b.post_id)
        .bind(b.created_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "insert bookmark", "bookmarks.user_post"))?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM bookmarks WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete bookmark")?;
        Ok(res.rows_affected() > 0)
    }
}
