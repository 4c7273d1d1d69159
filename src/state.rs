use crate::{
    auth::{
        jwt::TokenCodec,
        repo::{PgUserStore, UserStore},
    },
    bookmarks::repo::{BookmarkStore, PgBookmarkStore},
    categories::repo::{CategoryStore, PgCategoryStore},
    comments::repo::{CommentStore, PgCommentStore},
    config::{AppConfig, StoreBackend},
    db,
    memstore::{
        MemoryBookmarkStore, MemoryCategoryStore, MemoryCommentStore, MemoryPostStore,
        MemoryUserStore,
    },
    posts::repo::{PgPostStore, PostStore},
};
use anyhow::Context;
use sqlx::PgPool;
use std::sync::Arc;

/// Everything a handler can reach. Built once by the composition root.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenCodec,
    pub db: Option<PgPool>,
    pub users: Arc<dyn UserStore>,
    pub posts: Arc<dyn PostStore>,
    pub categories: Arc<dyn CategoryStore>,
    pub comments: Arc<dyn CommentStore>,
    pub bookmarks: Arc<dyn BookmarkStore>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        match config.store {
            StoreBackend::Postgres => {
                let db_cfg = config.db.as_ref().context("postgres store needs a DbConfig")?;
                let pool = db::connect(db_cfg).await?;
                db::migrate(&pool).await?;
                Ok(Self::from_pool(config, pool))
            }
            StoreBackend::Memory => {
                tracing::warn!("using the in-memory store; data is lost on exit");
                Ok(Self::in_memory(config))
            }
        }
    }

    pub fn from_pool(config: AppConfig, db: PgPool) -> Self {
        Self {
            tokens: TokenCodec::new(&config.jwt),
            config: Arc::new(config),
            users: Arc::new(PgUserStore::new(db.clone())),
            posts: Arc::new(PgPostStore::new(db.clone())),
            categories: Arc::new(PgCategoryStore::new(db.clone())),
            comments: Arc::new(PgCommentStore::new(db.clone())),
            bookmarks: Arc::new(PgBookmarkStore::new(db.clone())),
            db: Some(db),
        }
    }

    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            tokens: TokenCodec::new(&config.jwt),
            config: Arc::new(config),
            db: None,
            users: Arc::new(MemoryUserStore::default()),
            posts: Arc::new(MemoryPostStore::default()),
            categories: Arc::new(MemoryCategoryStore::default()),
            comments: Arc::new(MemoryCommentStore::default()),
            bookmarks: Arc::new(MemoryBookmarkStore::default()),
        }
    }

    /// Fresh in-memory state with the test configuration.
    pub fn fake() -> Self {
        Self::in_memory(AppConfig::for_tests())
    }

    /// Drains the pool, if there is one.
    pub async fn close(&self) {
        if let Some(db) = &self.db {
            db.close().await;
            tracing::info!("database pool closed");
        }
    }
}
