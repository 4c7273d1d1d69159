use anyhow::Context;
use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::db::write_error;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String, // unique, exact match
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    /// Sorted by name.
    async fn list(&self) -> anyhow::Result<Vec<Category>>;
    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Category>>;
    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Category>>;
    async fn insert(&self, category: Category) -> anyhow::Result<Category>;
}

const CATEGORY_COLUMNS: &str = "id, name, slug, description, color, created_at, updated_at";

pub struct PgCategoryStore {
    db: PgPool,
}

impl PgCategoryStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CategoryStore for PgCategoryStore {
    async fn list(&self) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories ORDER BY name ASC"
        ))
        .fetch_all(&self.db)
        .await
        .context("list categories")?;
        Ok(rows)
    }

    async fn find_by_slug(&self, slug: &str) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.db)
        .await
        .context("find category by slug")?;
        Ok(row)
    }

    async fn find_by_name(&self, name: &str) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.db)
        .await
        .context("find category by name")?;
        Ok(row)
    }

    async fn insert(&self, c: Category) -> anyhow::Result<Category> {
        let row = sqlx::query_as::<_, Category>(&format!(
            r#"
            INSERT INTO categories ({CATEGORY_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {CATEGORY_COLUMNS}
            "#
        ))
        .bind(c.id)
        .bind(&c.name)
        .bind(&c.slug)
        .bind(&c.description)
        .bind(&c.color)
        .bind(c.created_at)
        .bind(c.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| write_error(e, "insert category", "categories.name"))?;
        Ok(row)
    }
}
