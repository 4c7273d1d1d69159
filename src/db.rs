use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::{config::DbConfig, error::UniqueViolation};

/// Opens the process-wide pool. Called once from the composition root.
pub async fn connect(cfg: &DbConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_connections)
        .idle_timeout(cfg.idle_timeout)
        .acquire_timeout(cfg.acquire_timeout)
        .connect(&cfg.url)
        .await
        .context("connect to database")?;
    info!(max = cfg.max_connections, min = cfg.min_connections, "database pool ready");
    Ok(db)
}

/// A missing or partial schema is fatal; the server does not start.
pub async fn migrate(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    info!("migrations applied");
    Ok(())
}

/// Wraps a failed write. Unique violations come back as [`UniqueViolation`]
/// naming `constraint`; everything else carries `what` as context.
pub fn write_error(e: sqlx::Error, what: &'static str, constraint: &'static str) -> anyhow::Error {
    if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
        anyhow::Error::new(UniqueViolation(constraint))
    } else {
        anyhow::Error::new(e).context(what)
    }
}
