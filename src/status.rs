//! Sync state overview.
//!
//! Summarizes what the store knows (tracked article count, records
//! that never finished an upload) and the most recent run from the run
//! log. Used by `hsync status` to give confidence that the daily job
//! is doing its work.

use anyhow::Result;

use crate::config::Config;
use crate::report;
use crate::store::sqlite::SqliteStore;
use crate::store::MetadataStore;

pub async fn run_status(config: &Config) -> Result<()> {
    let store = SqliteStore::connect(&config.store).await?;
    let counts = store.count_records().await?;

    println!("helpsync — Sync Status");
    println!("======================");
    println!();
    println!("  Database:   {}", config.store.path.display());
    println!("  Articles:   {} tracked", counts.total);
    println!("  Pending:    {} never uploaded", counts.never_uploaded);

    match report::last_run(&config.log.path)? {
        Some(run) => {
            println!();
            println!(
                "  Last run:   {} ({})",
                run.timestamp.format("%Y-%m-%d %H:%M"),
                format_ts_relative(run.timestamp.timestamp())
            );
            println!(
                "    added={} updated={} skipped={} uploaded={} failed={}",
                run.added, run.updated, run.skipped, run.uploaded, run.failed
            );
        }
        None => {
            println!();
            println!("  Last run:   never");
        }
    }

    println!();

    store.close().await;
    Ok(())
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let delta = now - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else if delta < 86400 * 30 {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    } else {
        format_ts_iso(ts)
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| ts.to_string())
}
