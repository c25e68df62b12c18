//! The delta engine: classify fetched articles against stored records,
//! plan uploads, and reconcile upload outcomes back into the store.
//!
//! [`classify`] and [`plan`] are pure functions over snapshots (the
//! fetched article list and a map of prior records), so the engine's
//! decision-making is unit-testable without any collaborator.
//! [`reconcile`] performs the post-upload bookkeeping: retiring the
//! superseded file id and advancing the stored fingerprint.

use std::collections::HashMap;

use tracing::warn;

use crate::fingerprint;
use crate::models::{
    Article, ArticleRecord, Classification, Decision, DeltaPlan, Outcome, UploadInstruction,
};
use crate::store::MetadataStore;
use crate::uploader::IndexUploader;

/// Classify one article's fingerprint against its prior record.
pub fn classify(fingerprint: &str, prior: Option<&ArticleRecord>) -> Classification {
    match prior {
        None => Classification::Added,
        Some(record) if record.fingerprint != fingerprint => Classification::Updated,
        Some(_) => Classification::Skipped,
    }
}

/// Build the content that gets chunked and uploaded for an article:
/// title and source link above the body, matching what the index
/// serves back to the assistant.
pub fn upload_content(article: &Article) -> String {
    let mut content = format!("# {}\n", article.title);
    if let Some(url) = &article.html_url {
        content.push_str(&format!("Source: {}\n", url));
    }
    content.push('\n');
    content.push_str(&article.body);
    content
}

/// Produce per-article decisions and upload instructions for one run.
///
/// Decisions preserve the input article ordering. With `force`, the
/// fingerprint comparison is bypassed: articles that would be Skipped
/// are planned as Updated (their stored file id is still carried for
/// retirement).
pub fn plan(articles: &[Article], prior: &HashMap<i64, ArticleRecord>, force: bool) -> DeltaPlan {
    let mut result = DeltaPlan::default();

    for article in articles {
        let fp = fingerprint::fingerprint(&article.title, &article.body);
        let record = prior.get(&article.id);
        let mut classification = classify(&fp, record);

        if force && classification == Classification::Skipped {
            classification = Classification::Updated;
        }

        result.decisions.push(Decision {
            id: article.id,
            classification,
        });

        if classification != Classification::Skipped {
            result.instructions.push(UploadInstruction {
                id: article.id,
                title: article.title.clone(),
                content: upload_content(article),
                fingerprint: fp,
                previous_file_id: record.and_then(|r| r.file_id.clone()),
            });
        }
    }

    result
}

/// Record a successful upload: retire the superseded file id (best
/// effort — a failure is logged and the orphaned entry left for manual
/// cleanup), then write the new record. A store-write failure leaves
/// the prior record in place so the article is retried next run.
pub async fn reconcile(
    store: &dyn MetadataStore,
    uploader: &dyn IndexUploader,
    instruction: &UploadInstruction,
    new_file_id: &str,
    now: i64,
) -> Outcome {
    if let Some(previous) = &instruction.previous_file_id {
        if previous != new_file_id {
            if let Err(err) = uploader.retire(previous).await {
                warn!(
                    article_id = instruction.id,
                    file_id = %previous,
                    "failed to retire superseded index file, leaving orphan: {err:#}"
                );
            }
        }
    }

    let record = ArticleRecord {
        id: instruction.id,
        fingerprint: instruction.fingerprint.clone(),
        file_id: Some(new_file_id.to_string()),
        last_synced_at: now,
    };

    match store.put_record(&record).await {
        Ok(()) => Outcome::Uploaded,
        Err(err) => Outcome::StoreWriteFailed(format!("{err:#}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn article(id: i64, title: &str, body: &str) -> Article {
        Article {
            id,
            title: title.to_string(),
            body: body.to_string(),
            updated_at: Utc::now(),
            html_url: None,
        }
    }

    fn record_for(article: &Article, file_id: Option<&str>) -> ArticleRecord {
        ArticleRecord {
            id: article.id,
            fingerprint: fingerprint::fingerprint(&article.title, &article.body),
            file_id: file_id.map(|s| s.to_string()),
            last_synced_at: 0,
        }
    }

    #[test]
    fn test_classify_added_without_prior_record() {
        assert_eq!(classify("abc", None), Classification::Added);
    }

    #[test]
    fn test_classify_updated_on_fingerprint_mismatch() {
        let prior = ArticleRecord {
            id: 1,
            fingerprint: "old".to_string(),
            file_id: None,
            last_synced_at: 0,
        };
        assert_eq!(classify("new", Some(&prior)), Classification::Updated);
    }

    #[test]
    fn test_classify_skipped_on_fingerprint_match() {
        let prior = ArticleRecord {
            id: 1,
            fingerprint: "same".to_string(),
            file_id: None,
            last_synced_at: 0,
        };
        assert_eq!(classify("same", Some(&prior)), Classification::Skipped);
    }

    #[test]
    fn test_whitespace_only_edit_is_skipped() {
        let original = article(7, "Install guide", "Step one.\nStep two.");
        let reformatted = article(7, "Install guide", "  Step   one.\n\n\tStep two.  ");
        let mut prior = HashMap::new();
        prior.insert(7, record_for(&original, Some("file-7")));

        let result = plan(&[reformatted], &prior, false);
        assert_eq!(result.decisions[0].classification, Classification::Skipped);
        assert!(result.instructions.is_empty());
    }

    #[test]
    fn test_plan_mixed_batch() {
        let a = article(1, "A", "unchanged body");
        let b_old = article(2, "B", "old body");
        let b_new = article(2, "B", "new body");
        let c = article(3, "C", "brand new");

        let mut prior = HashMap::new();
        prior.insert(1, record_for(&a, Some("file-a")));
        prior.insert(2, record_for(&b_old, Some("file-b")));

        let articles = vec![a, b_new, c];
        let result = plan(&articles, &prior, false);

        assert_eq!(result.count(Classification::Skipped), 1);
        assert_eq!(result.count(Classification::Updated), 1);
        assert_eq!(result.count(Classification::Added), 1);

        // Only B and C get instructions, in input order.
        let ids: Vec<i64> = result.instructions.iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![2, 3]);
        assert_eq!(
            result.instructions[0].previous_file_id.as_deref(),
            Some("file-b")
        );
        assert_eq!(result.instructions[1].previous_file_id, None);
    }

    #[test]
    fn test_plan_preserves_input_order() {
        let articles = vec![
            article(30, "Third", "c"),
            article(10, "First", "a"),
            article(20, "Second", "b"),
        ];
        let result = plan(&articles, &HashMap::new(), false);
        let ids: Vec<i64> = result.decisions.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn test_force_replans_skipped_as_updated() {
        let a = article(5, "A", "same as stored");
        let mut prior = HashMap::new();
        prior.insert(5, record_for(&a, Some("file-5")));

        let result = plan(std::slice::from_ref(&a), &prior, true);
        assert_eq!(result.decisions[0].classification, Classification::Updated);
        assert_eq!(
            result.instructions[0].previous_file_id.as_deref(),
            Some("file-5")
        );
    }

    #[test]
    fn test_upload_content_carries_title_and_source() {
        let mut a = article(9, "Reset your password", "Body text.");
        a.html_url = Some("https://help.example.com/articles/9".to_string());
        let content = upload_content(&a);
        assert!(content.starts_with("# Reset your password\n"));
        assert!(content.contains("Source: https://help.example.com/articles/9"));
        assert!(content.ends_with("Body text."));
    }
}
