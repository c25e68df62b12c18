//! SQLite-backed [`MetadataStore`].

use std::str::FromStr;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;

use crate::config::StoreConfig;
use crate::models::ArticleRecord;

use super::{MetadataStore, RecordCounts};

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the SQLite database at the configured
    /// path. The schema itself is created by `migrate::run_migrations`.
    pub async fn connect(config: &StoreConfig) -> Result<Self> {
        let db_path = &config.path;

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> ArticleRecord {
    ArticleRecord {
        id: row.get("id"),
        fingerprint: row.get("fingerprint"),
        file_id: row.get("file_id"),
        last_synced_at: row.get("last_synced_at"),
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn get_record(&self, id: i64) -> Result<Option<ArticleRecord>> {
        let row = sqlx::query(
            "SELECT id, fingerprint, file_id, last_synced_at FROM articles WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(row_to_record))
    }

    async fn put_record(&self, record: &ArticleRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO articles (id, fingerprint, file_id, last_synced_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                fingerprint = excluded.fingerprint,
                file_id = excluded.file_id,
                last_synced_at = excluded.last_synced_at
            "#,
        )
        .bind(record.id)
        .bind(&record.fingerprint)
        .bind(&record.file_id)
        .bind(record.last_synced_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<ArticleRecord>> {
        let rows = sqlx::query(
            "SELECT id, fingerprint, file_id, last_synced_at FROM articles ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(row_to_record).collect())
    }

    async fn count_records(&self) -> Result<RecordCounts> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM articles")
            .fetch_one(&self.pool)
            .await?;

        let never_uploaded: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM articles WHERE file_id IS NULL")
                .fetch_one(&self.pool)
                .await?;

        Ok(RecordCounts {
            total,
            never_uploaded,
        })
    }
}
