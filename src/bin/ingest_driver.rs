//! RSS ingestion driver: polls every active feed, normalizes and dedups
//! titles, and persists `pending` rows.
//!
//! Grounded on `original_source/apps/ingest/run_ingestion.py`'s
//! `IngestionRunner`: active-feed loop, per-feed try/continue isolation,
//! an automation-friendly one-line summary, and exit code 1 on any feed
//! error (0 clean, 130 on SIGINT).

use std::io::BufRead;

use clap::Parser;
use futures_util::stream::{self, StreamExt};
use tracing::{error, info, warn};

use stratnews::cli::IngestArgs;
use stratnews::config::PipelineConfig;
use stratnews::error::PipelineError;
use stratnews::ingest::FeedFetcher;
use stratnews::store::{self, FeedStore};

#[derive(Default)]
struct RunStats {
    feeds_processed: u64,
    feeds_success: u64,
    feeds_errors: u64,
    total_fetched: u64,
    total_inserted: u64,
    total_skipped: u64,
    total_errors: u64,
}

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    let args = IngestArgs::parse();
    stratnews::telemetry::init(args.global.verbose);

    let mut config = PipelineConfig::from_env();
    if let Some(url) = args.global.database_url.clone() {
        config.database_url = url;
    }

    let pool = store::connect(&config.database_url, config.ingest_concurrency as u32).await?;
    let feeds = FeedStore::new(pool.clone());

    if args.summary {
        let feed_summary = feeds.summary().await?;
        let title_summary = store::TitleStore::new(pool.clone()).summary().await?;
        println!("Database Summary:");
        println!("  Feeds: {}/{} active", feed_summary.active, feed_summary.total);
        println!(
            "  Titles: {} total, {} pending, {} gated",
            title_summary.total, title_summary.pending, title_summary.gated
        );
        return Ok(());
    }

    if let Some(path) = &args.feeds_file {
        seed_feeds_from_file(&feeds, path).await?;
    }

    let mut registrations = feeds.list_active().await?;
    if let Some(max) = args.max_feeds {
        registrations.truncate(max);
    }

    info!(count = registrations.len(), "starting RSS ingestion across active feeds");

    let fetcher = FeedFetcher::new(pool, config.clone())?;
    let mut tasks = stream::iter(registrations.into_iter().map(|feed| {
        let fetcher = fetcher.clone();
        async move {
            let max_items = feed.max_items_override.map(|v| v as usize);
            let result = fetcher.fetch_one(&feed.url, max_items).await;
            (feed.url, result)
        }
    }))
    .buffer_unordered(config.ingest_concurrency);

    let mut stats = RunStats::default();
    let mut interrupted = false;

    loop {
        tokio::select! {
            next = tasks.next() => {
                match next {
                    Some((url, Ok(feed_stats))) => {
                        stats.feeds_processed += 1;
                        stats.feeds_success += 1;
                        stats.total_fetched += feed_stats.fetched as u64;
                        stats.total_inserted += feed_stats.inserted as u64;
                        stats.total_skipped += feed_stats.skipped as u64;
                        stats.total_errors += feed_stats.errors as u64;
                        info!(
                            feed = url,
                            fetched = feed_stats.fetched,
                            inserted = feed_stats.inserted,
                            skipped = feed_stats.skipped,
                            not_modified = feed_stats.not_modified,
                            "feed complete",
                        );
                    }
                    Some((url, Err(e))) => {
                        stats.feeds_processed += 1;
                        stats.feeds_errors += 1;
                        error!(feed = url, error = %e, "feed ingestion failed");
                    }
                    None => break,
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("ingestion interrupted by operator");
                interrupted = true;
                break;
            }
        }
    }

    if interrupted {
        std::process::exit(130);
    }

    println!(
        "INGESTION_RESULT: {}/{} feeds success, {} inserted, {} skipped",
        stats.feeds_success, stats.feeds_processed, stats.total_inserted, stats.total_skipped
    );
    info!(
        total_fetched = stats.total_fetched,
        total_errors = stats.total_errors,
        "ingestion run complete",
    );

    std::process::exit(if stats.feeds_errors == 0 { 0 } else { 1 });
}

/// Seed `feeds` from a newline-delimited file of URLs (blank lines and
/// `#`-prefixed comments ignored), used to bootstrap a fresh database.
async fn seed_feeds_from_file(feeds: &FeedStore, path: &std::path::Path) -> Result<(), PipelineError> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    for line in reader.lines() {
        let line = line?;
        let url = line.trim();
        if url.is_empty() || url.starts_with('#') {
            continue;
        }
        feeds.register(url, None).await?;
    }
    Ok(())
}
