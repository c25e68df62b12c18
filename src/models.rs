//! Core data models used throughout helpsync.
//!
//! These types represent the articles, persisted sync records, and
//! per-run decisions that flow through the delta engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One help-center article as fetched from the source this run.
#[derive(Debug, Clone)]
pub struct Article {
    /// Stable external identifier, unique per source.
    pub id: i64,
    pub title: String,
    /// Body text with markup already stripped by the fetcher.
    pub body: String,
    /// Source-reported last-modified time. Advisory only — change
    /// detection relies on the content fingerprint, never on this.
    pub updated_at: DateTime<Utc>,
    pub html_url: Option<String>,
}

/// Last known synced state of one article, as persisted in the
/// metadata store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRecord {
    pub id: i64,
    /// Fingerprint of the last successfully uploaded content.
    pub fingerprint: String,
    /// Opaque identifier of the currently indexed version, absent if
    /// the article was never successfully uploaded.
    pub file_id: Option<String>,
    /// Unix timestamp of the last successful sync.
    pub last_synced_at: i64,
}

/// Outcome of comparing a fetched article against its stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    /// No stored record exists for this id.
    Added,
    /// A record exists and its fingerprint differs.
    Updated,
    /// A record exists with an identical fingerprint.
    Skipped,
}

/// Work item emitted by the planner for one Added/Updated article.
#[derive(Debug, Clone)]
pub struct UploadInstruction {
    pub id: i64,
    pub title: String,
    /// Full content to be chunked and uploaded.
    pub content: String,
    /// Fingerprint the record will carry once the upload succeeds.
    pub fingerprint: String,
    /// File id of the superseded indexed version, if any.
    pub previous_file_id: Option<String>,
}

/// Per-article decision, in fetch order.
#[derive(Debug, Clone)]
pub struct Decision {
    pub id: i64,
    pub classification: Classification,
}

/// The planner's output for one run: ordered decisions plus the upload
/// instructions for every Added/Updated article.
#[derive(Debug, Clone, Default)]
pub struct DeltaPlan {
    pub decisions: Vec<Decision>,
    pub instructions: Vec<UploadInstruction>,
}

impl DeltaPlan {
    pub fn count(&self, class: Classification) -> usize {
        self.decisions
            .iter()
            .filter(|d| d.classification == class)
            .count()
    }
}

/// What happened to one Added/Updated article after its upload was
/// attempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum Outcome {
    Uploaded,
    UploadFailed(String),
    StoreWriteFailed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Uploaded)
    }
}
