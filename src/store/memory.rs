//! In-memory [`MetadataStore`] implementation for tests.
//!
//! Uses a `HashMap` behind `std::sync::RwLock` for thread safety; all
//! futures are immediately ready.

use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::Result;
use async_trait::async_trait;

use crate::models::ArticleRecord;

use super::{MetadataStore, RecordCounts};

#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<i64, ArticleRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with prior records (test setup helper).
    pub fn with_records(records: impl IntoIterator<Item = ArticleRecord>) -> Self {
        let store = Self::new();
        {
            let mut map = store.records.write().unwrap();
            for record in records {
                map.insert(record.id, record);
            }
        }
        store
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn get_record(&self, id: i64) -> Result<Option<ArticleRecord>> {
        Ok(self.records.read().unwrap().get(&id).cloned())
    }

    async fn put_record(&self, record: &ArticleRecord) -> Result<()> {
        self.records
            .write()
            .unwrap()
            .insert(record.id, record.clone());
        Ok(())
    }

    async fn list_records(&self) -> Result<Vec<ArticleRecord>> {
        let mut records: Vec<ArticleRecord> =
            self.records.read().unwrap().values().cloned().collect();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn count_records(&self) -> Result<RecordCounts> {
        let records = self.records.read().unwrap();
        Ok(RecordCounts {
            total: records.len() as i64,
            never_uploaded: records.values().filter(|r| r.file_id.is_none()).count() as i64,
        })
    }
}
