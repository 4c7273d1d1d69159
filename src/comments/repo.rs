use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{auth::authz::Owned, envelope::Pagination};

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub post_title: String,
    pub post_slug: String,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Comment {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

#[derive(Debug, Clone, Default)]
pub struct CommentFilter {
    pub post_id: Option<Uuid>,
    pub author_id: Option<Uuid>,
}

impl CommentFilter {
    pub fn matches(&self, c: &Comment) -> bool {
        self.post_id.map_or(true, |p| c.post_id == p) && self.author_id.map_or(true, |a| c.author_id == a)
    }
}

#[async_trait]
pub trait CommentStore: Send + Sync {
    /// Newest first; the count ignores paging.
    async fn list(&self, filter: &CommentFilter, page: Pagination) -> anyhow::Result<(Vec<Comment>, i64)>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>>;
    async fn insert(&self, comment: Comment) -> anyhow::Result<Comment>;
    async fn update_content(&self, id: Uuid, content: &str) -> anyhow::Result<Option<Comment>>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

const COMMENT_COLUMNS: &str = "id, post_id, post_title, post_slug, author_id, author_name, \
    author_avatar, content, is_verified, created_at, updated_at";

const COMMENT_FILTER: &str = "($1::uuid IS NULL OR post_id = $1) AND ($2::uuid IS NULL OR author_id = $2)";

pub struct PgCommentStore {
    db: PgPool,
}

impl PgCommentStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CommentStore for PgCommentStore {
    async fn list(&self, filter: &CommentFilter, page: Pagination) -> anyhow::Result<(Vec<Comment>, i64)> {
        let rows = sqlx::query_as::<_, Comment>(&format!(
            r#"
            SELECT {COMMENT_COLUMNS}
              FROM comments
             WHERE {COMMENT_FILTER}
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4
            "#
        ))
        .bind(filter.post_id)
        .bind(filter.author_id)
        .bind(page.limit)
        .bind(page.skip)
        .fetch_all(&self.db)
        .await
        .context("list comments")?;

        let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM comments WHERE {COMMENT_FILTER}"))
            .bind(filter.post_id)
            .bind(filter.author_id)
            .fetch_one(&self.db)
            .await
            .context("count comments")?;

        Ok((rows, total))
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(&format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find comment")?;
        Ok(row)
    }

    async fn insert(&self, c: Comment) -> anyhow::Result<Comment> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            r#"
            INSERT INTO comments ({COMMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(c.id)
        .bind(c.post_id)
        .bind(&c.post_title)
        .bind(&c.post_slug)
        .bind(c.author_id)
        .bind(&c.author_name)
        .bind(&c.author_avatar)
        .bind(&c.content)
        .bind(c.is_verified)
        .bind(c.created_at)
        .bind(c.updated_at)
        .fetch_one(&self.db)
        .await
        .context("insert comment")?;
        Ok(row)
    }

    async fn update_content(&self, id: Uuid, content: &str) -> anyhow::Result<Option<Comment>> {
        let row = sqlx::query_as::<_, Comment>(&format!(
            r#"
            UPDATE comments SET content = $2, updated_at = now()
             WHERE id = $1
            RETURNING {COMMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(content)
        .fetch_optional(&self.db)
        .await
        .context("update comment")?;
        Ok(row)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete comment")?;
        Ok(res.rows_affected() > 0)
    }
}
