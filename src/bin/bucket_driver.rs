//! Bucket Manager driver: groups recently gated titles into time-windowed
//! actor-set clusters and persists them.
//!
//! Grounded on `original_source/apps/clust2/run_clust2.py`'s `run_clust2`
//! CLI entry point: a single pass over the lookback window, an
//! automation-friendly summary line, `--dry-run` for inspection without
//! writes.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use stratnews::bucket::BucketManager;
use stratnews::cli::BucketArgs;
use stratnews::config::PipelineConfig;
use stratnews::error::PipelineError;
use stratnews::store;
use stratnews::vocab::{loader, ActorMatcher};

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    let args = BucketArgs::parse();
    stratnews::telemetry::init(args.global.verbose);

    let mut config = PipelineConfig::from_env();
    if let Some(url) = args.global.database_url.clone() {
        config.database_url = url;
    }
    if let Some(hours) = args.hours {
        config.bucket_window_hours = hours;
    }
    if let Some(path) = args.global.actors_csv.clone() {
        config.actors_csv_path = path;
    }

    let pool = store::connect(&config.database_url, 1).await?;

    let records = loader::load_actor_aliases(std::path::Path::new(&config.actors_csv_path))?;
    let matcher = Arc::new(ActorMatcher::build(&records));
    info!(entities = records.len(), "actor vocabulary loaded");

    let manager = BucketManager::new(pool, matcher, &config);

    let outcome = tokio::select! {
        result = manager.run(args.dry_run) => result,
        _ = tokio::signal::ctrl_c() => {
            warn!("bucketing interrupted by operator");
            std::process::exit(130);
        }
    };

    let stats = outcome?;

    if args.summary || args.dry_run {
        println!(
            "BUCKET_RESULT: {} candidates, {} inserted, {} skipped ({}ms){}",
            stats.candidates,
            stats.inserted,
            stats.skipped,
            stats.duration.as_millis(),
            if args.dry_run { " [dry run]" } else { "" },
        );
    } else {
        println!(
            "BUCKET_RESULT: {} candidates, {} inserted, {} skipped",
            stats.candidates, stats.inserted, stats.skipped
        );
    }

    std::process::exit(0);
}
