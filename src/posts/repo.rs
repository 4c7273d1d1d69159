use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{auth::authz::Owned, db::write_error, envelope::Pagination};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum PostStatus {
    Draft,
    Published,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub content: String, // editor HTML, stored as-is
    pub excerpt: Option<String>,
    pub cover_image: Option<String>,
    pub author_id: Uuid, // set once at creation
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub categories: Vec<String>, // category slugs
    pub tags: Vec<String>,
    pub status: PostStatus,
    pub featured: bool,
    pub view_count: i64,
    pub comment_count: i64,
    pub reading_time: i32, // minutes
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Owned for Post {
    fn author_id(&self) -> Uuid {
        self.author_id
    }
}

/// Equality filters for listing. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub status: Option<PostStatus>,
    pub author_id: Option<Uuid>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub featured: Option<bool>,
}

impl PostFilter {
    pub fn published() -> Self {
        Self {
            status: Some(PostStatus::Published),
            ..Default::default()
        }
    }

    pub fn matches(&self, post: &Post) -> bool {
        self.status.map_or(true, |s| post.status == s)
            && self.author_id.map_or(true, |a| post.author_id == a)
            && self.category.as_ref().map_or(true, |c| post.categories.contains(c))
            && self.tag.as_ref().map_or(true, |t| post.tags.contains(t))
            && self.featured.map_or(true, |f| post.featured == f)
    }
}

#[async_trait]
pub trait PostStore: Send + Sync {
    /// Newest first. `page == None` returns every match. The count ignores paging.
    async fn list(&self, filter: &PostFilter, page: Option<Pagination>) -> anyhow::Result<(Vec<Post>, i64)>;
    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Post>>;
    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>>;
    async fn insert(&self, post: Post) -> anyhow::Result<Post>;
    /// Writes every mutable field of `post`. Returns false if it is gone.
    async fn update(&self, post: &Post) -> anyhow::Result<bool>;
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
    async fn increment_views(&self, id: Uuid) -> anyhow::Result<()>;
    async fn adjust_comment_count(&self, id: Uuid, delta: i64) -> anyhow::Result<()>;
}

const POST_COLUMNS: &str = "id, title, slug, content, excerpt, cover_image, author_id, author_name, \
    author_avatar, categories, tags, status, featured, view_count, comment_count, reading_time, \
    created_at, updated_at";

const POST_FILTER: &str = r#"
    ($1::text IS NULL OR status = $1)
    AND ($2::uuid IS NULL OR author_id = $2)
    AND ($3::text IS NULL OR $3 = ANY(categories))
    AND ($4::text IS NULL OR $4 = ANY(tags))
    AND ($5::bool IS NULL OR featured = $5)
"#;

pub struct PgPostStore {
    db: PgPool,
}

impl PgPostStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostStore for PgPostStore {
    async fn list(&self, filter: &PostFilter, page: Option<Pagination>) -> anyhow::Result<(Vec<Post>, i64)> {
        let (limit, offset) = page.map_or((None, 0), |p| (Some(p.limit), p.skip));
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
              FROM posts
             WHERE {POST_FILTER}
             ORDER BY created_at DESC
             LIMIT $6 OFFSET $7
            "#
        ))
        .bind(filter.status)
        .bind(filter.author_id)
        .bind(&filter.category)
        .bind(&filter.tag)
        .bind(filter.featured)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list posts")?;

        let (total,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM posts WHERE {POST_FILTER}"))
            .bind(filter.status)
            .bind(filter.author_id)
            .bind(&filter.category)
            .bind(&filter.tag)
            .bind(filter.featured)
            .fetch_one(&self.db)
            .await
            .context("count posts")?;

        Ok((posts, total))
    }

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE slug = $1"))
            .bind(slug)
            .fetch_optional(&self.db)
            .await
            .context("find post by slug")?;
        Ok(post)
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!("SELECT {POST_COLUMNS} FROM posts WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await
            .context("find post by id")?;
        Ok(post)
    }

    async fn insert(&self, post: Post) -> anyhow::Result<Post> {
        let row = sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts ({POST_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.cover_image)
        .bind(post.author_id)
        .bind(&post.author_name)
        .bind(&post.author_avatar)
        .bind(&post.categories)
        .bind(&post.tags)
        .bind(post.status)
        .bind(post.featured)
        .bind(post.view_count)
        .bind(post.comment_count)
        .bind(post.reading_time)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "insert post", "posts.slug"))?;
        Ok(row)
    }

    async fn update(&self, post: &Post) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
            UPDATE posts
               SET title = $2, slug = $3, content = $4, excerpt = $5, cover_image = $6,
                   categories = $7, tags = $8, status = $9, featured = $10,
                   reading_time = $11, updated_at = $12
             WHERE id = $1
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.content)
        .bind(&post.excerpt)
        .bind(&post.cover_image)
        .bind(&post.categories)
        .bind(&post.tags)
        .bind(post.status)
        .bind(post.featured)
        .bind(post.reading_time)
        .bind(post.updated_at)
        .execute(&self.db)
        .await
        .map_err(|e| write_error(e, "update post", "posts.slug"))?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("delete post")?;
        Ok(res.rows_affected() > 0)
    }

    async fn increment_views(&self, id: Uuid) -> anyhow::Result<()> {
        sqlx::query("UPDATE posts SET view_count = view_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await
            .context("increment view count")?;
        Ok(())
    }

    async fn adjust_comment_count(&self, id: Uuid, delta: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE posts SET comment_count = GREATEST(comment_count + $2, 0) WHERE id = $1")
            .bind(id)
            .bind(delta)
            .execute(&self.db)
            .await
            .context("adjust comment count")?;
        Ok(())
    }
}
