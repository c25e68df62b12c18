//! Sync run orchestration.
//!
//! Coordinates one full run: fetch → plan → upload changed articles →
//! reconcile → run log. Fetch failures abort the run before anything
//! is written; per-article upload failures are recorded and never stop
//! the remaining articles.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::chunk::chunk_text;
use crate::config::{ChunkingConfig, Config};
use crate::delta;
use crate::fetcher::{ArticleSource, HelpCenterFetcher};
use crate::models::{Article, ArticleRecord, Outcome};
use crate::report::{self, RunReport};
use crate::store::sqlite::SqliteStore;
use crate::store::MetadataStore;
use crate::uploader::{IndexUploader, VectorStoreUploader};

pub async fn run_sync(
    config: &Config,
    full: bool,
    dry_run: bool,
    limit: Option<usize>,
) -> Result<()> {
    let store = SqliteStore::connect(&config.store).await?;

    let fetcher = HelpCenterFetcher::new(&config.source)?;
    let mut articles = fetcher
        .fetch_articles()
        .await
        .context("Article fetch failed, aborting run")?;

    if let Some(lim) = limit {
        articles.truncate(lim);
    }

    if dry_run {
        let prior = prior_records(&store).await?;
        let plan = delta::plan(&articles, &prior, full);
        let total_segments: usize = plan
            .instructions
            .iter()
            .map(|i| chunk_text(&i.content, &config.chunking).len())
            .sum();
        println!("sync (dry-run)");
        println!("  fetched: {} articles", articles.len());
        println!("  to upload: {} articles", plan.instructions.len());
        println!("  estimated segments: {}", total_segments);
        store.close().await;
        return Ok(());
    }

    let uploader = VectorStoreUploader::connect(&config.index).await?;

    let report = execute_run(&store, &uploader, &articles, &config.chunking, full).await?;

    report::append_run(&config.log.path, &report)?;

    println!("sync {}", config.index.store_name);
    println!("  fetched: {} articles", articles.len());
    println!("  added: {}", report.added);
    println!("  updated: {}", report.updated);
    println!("  skipped: {}", report.skipped);
    println!("  uploaded: {}", report.uploaded);
    println!("  failed: {}", report.failed);
    println!("  run log: {}", config.log.path.display());
    println!("ok");

    store.close().await;
    Ok(())
}

/// Snapshot the store's records into a lookup map for the planner.
async fn prior_records(store: &dyn MetadataStore) -> Result<HashMap<i64, ArticleRecord>> {
    let records = store.list_records().await?;
    Ok(records.into_iter().map(|r| (r.id, r)).collect())
}

/// Plan and execute one run against the given collaborators.
///
/// Articles are processed strictly in fetch order; each Added/Updated
/// article is chunked, uploaded, and reconciled before the next one is
/// touched. A failed upload leaves that article's record unchanged and
/// is surfaced only through the report.
pub async fn execute_run(
    store: &dyn MetadataStore,
    uploader: &dyn IndexUploader,
    articles: &[Article],
    chunking: &ChunkingConfig,
    full: bool,
) -> Result<RunReport> {
    let prior = prior_records(store).await?;
    let plan = delta::plan(articles, &prior, full);
    let now = chrono::Utc::now();

    let mut outcomes: Vec<(i64, Outcome)> = Vec::with_capacity(plan.instructions.len());

    for instruction in &plan.instructions {
        let segments = chunk_text(&instruction.content, chunking);

        let outcome = match uploader
            .upload(instruction.id, &instruction.title, &segments)
            .await
        {
            Ok(file_id) => {
                info!(
                    article_id = instruction.id,
                    file_id = %file_id,
                    segments = segments.len(),
                    "uploaded article"
                );
                delta::reconcile(store, uploader, instruction, &file_id, now.timestamp()).await
            }
            Err(err) => {
                warn!(article_id = instruction.id, "upload failed: {err:#}");
                Outcome::UploadFailed(format!("{err:#}"))
            }
        };

        outcomes.push((instruction.id, outcome));
    }

    Ok(RunReport::from_plan(&plan, &outcomes, now))
}
