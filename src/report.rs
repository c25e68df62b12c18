//! Per-run summary report and its append-only log.
//!
//! Every sync run produces one [`RunReport`]: classification counts,
//! upload counts, and a per-article detail list in fetch order. The
//! report is appended as a single JSON line to the configured run log,
//! giving the operations team an auditable history of what changed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Classification, DeltaPlan, Outcome};

/// One article's line in the run report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDetail {
    pub id: i64,
    pub classification: Classification,
    /// Absent for skipped articles (nothing was attempted).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
}

/// Summary of one sync run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub timestamp: DateTime<Utc>,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub uploaded: usize,
    pub failed: usize,
    pub details: Vec<ArticleDetail>,
}

impl RunReport {
    /// Assemble the report from the plan's ordered decisions and the
    /// outcome of each attempted upload.
    pub fn from_plan(
        plan: &DeltaPlan,
        outcomes: &[(i64, Outcome)],
        timestamp: DateTime<Utc>,
    ) -> Self {
        let details: Vec<ArticleDetail> = plan
            .decisions
            .iter()
            .map(|decision| ArticleDetail {
                id: decision.id,
                classification: decision.classification,
                outcome: outcomes
                    .iter()
                    .find(|(id, _)| *id == decision.id)
                    .map(|(_, outcome)| outcome.clone()),
            })
            .collect();

        let uploaded = outcomes.iter().filter(|(_, o)| o.is_success()).count();
        let failed = outcomes.len() - uploaded;

        Self {
            run_id: Uuid::new_v4().to_string(),
            timestamp,
            added: plan.count(Classification::Added),
            updated: plan.count(Classification::Updated),
            skipped: plan.count(Classification::Skipped),
            uploaded,
            failed,
            details,
        }
    }
}

/// Append one run report as a JSON line to the run log.
pub fn append_run(path: &Path, report: &RunReport) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open run log: {}", path.display()))?;

    let line = serde_json::to_string(report)?;
    writeln!(file, "{}", line)?;
    Ok(())
}

/// Read back the most recent run report, if the log has any.
pub fn last_run(path: &Path) -> Result<Option<RunReport>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to read run log: {}", path.display()))
        }
    };

    let last_line = match content.lines().rev().find(|line| !line.trim().is_empty()) {
        Some(line) => line,
        None => return Ok(None),
    };

    let report = serde_json::from_str(last_line)
        .with_context(|| format!("Malformed run log entry in {}", path.display()))?;
    Ok(Some(report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Decision;

    fn sample_plan() -> DeltaPlan {
        DeltaPlan {
            decisions: vec![
                Decision {
                    id: 1,
                    classification: Classification::Skipped,
                },
                Decision {
                    id: 2,
                    classification: Classification::Updated,
                },
                Decision {
                    id: 3,
                    classification: Classification::Added,
                },
            ],
            instructions: Vec::new(),
        }
    }

    #[test]
    fn test_report_counts() {
        let outcomes = vec![
            (2, Outcome::Uploaded),
            (3, Outcome::UploadFailed("boom".to_string())),
        ];
        let report = RunReport::from_plan(&sample_plan(), &outcomes, Utc::now());

        assert_eq!(report.added, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.uploaded, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.details.len(), 3);
        assert!(report.details[0].outcome.is_none());
    }

    #[test]
    fn test_append_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log/runs.jsonl");

        let first = RunReport::from_plan(&sample_plan(), &[(2, Outcome::Uploaded)], Utc::now());
        let second = RunReport::from_plan(&sample_plan(), &[], Utc::now());

        append_run(&path, &first).unwrap();
        append_run(&path, &second).unwrap();

        let read = last_run(&path).unwrap().unwrap();
        assert_eq!(read.run_id, second.run_id);

        let lines = std::fs::read_to_string(&path).unwrap();
        assert_eq!(lines.lines().count(), 2);
    }

    #[test]
    fn test_last_run_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        assert!(last_run(&dir.path().join("absent.jsonl"))
            .unwrap()
            .is_none());
    }
}
