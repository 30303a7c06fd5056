use anyhow::Result;
use sqlx::SqlitePool;

use crate::config::Config;
use crate::db;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let pool = db::connect(config).await?;
    apply(&pool).await?;
    pool.close().await;
    Ok(())
}

/// Create the schema on an open pool. Idempotent.
pub async fn apply(pool: &SqlitePool) -> Result<()> {
    // Every persisted document (cache entries, rate windows) lives here.
    // `expires_at` mirrors the document's `expiresAt` field for sweeps.
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS kv_documents (
            key TEXT PRIMARY KEY,
            doc TEXT NOT NULL,
            expires_at INTEGER,
            updated_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_kv_documents_expires_at ON kv_documents(expires_at)")
        .execute(pool)
        .await?;

    Ok(())
}
