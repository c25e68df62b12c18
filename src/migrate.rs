use anyhow::Result;

use crate::config::Config;
use crate::store::sqlite::SqliteStore;

pub async fn run_migrations(config: &Config) -> Result<()> {
    let store = SqliteStore::connect(&config.store).await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS articles (
            id INTEGER PRIMARY KEY,
            fingerprint TEXT NOT NULL,
            file_id TEXT,
            last_synced_at INTEGER NOT NULL
        )
        "#,
    )
    .execute(store.pool())
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_articles_last_synced_at ON articles(last_synced_at DESC)",
    )
    .execute(store.pool())
    .await?;

    store.close().await;
    Ok(())
}
