//! Metadata store abstraction.
//!
//! The [`MetadataStore`] trait is the engine's narrow contract with
//! persistence: one record per known article, keyed by the article's
//! external id. Backends: SQLite ([`sqlite::SqliteStore`]) for real
//! runs, in-memory ([`memory::MemoryStore`]) for collaborator-free
//! tests.

pub mod memory;
pub mod sqlite;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ArticleRecord;

/// Aggregate counts reported by `hsync status`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordCounts {
    pub total: i64,
    /// Records that never completed an upload (no file id).
    pub never_uploaded: i64,
}

/// Persistent last-known sync state, one record per article id.
///
/// Writes for different ids are independent; the engine never issues
/// concurrent writes for the same id within a run.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Fetch the record for one article id, if any.
    async fn get_record(&self, id: i64) -> Result<Option<ArticleRecord>>;

    /// Insert or replace the record for `record.id`.
    async fn put_record(&self, record: &ArticleRecord) -> Result<()>;

    /// All records, ordered by article id.
    async fn list_records(&self) -> Result<Vec<ArticleRecord>>;

    /// Aggregate counts for status reporting.
    async fn count_records(&self) -> Result<RecordCounts>;
}
