//! Strategic Gate driver: batches pending titles through the actor
//! vocabulary and marks them `gated`.
//!
//! Grounded on `original_source/apps/clust1/run_gate.py`'s `GateProcessor`
//! CLI entry point: batch loop until an empty fetch or `--max-batches`,
//! automation-friendly summary line, exit 1 on any batch error, 130 on
//! SIGINT.

use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};

use stratnews::cli::GateArgs;
use stratnews::config::PipelineConfig;
use stratnews::error::PipelineError;
use stratnews::gate::{GateStats, StrategicGate};
use stratnews::store;
use stratnews::vocab::{loader, ActorMatcher};

#[tokio::main]
async fn main() -> Result<(), PipelineError> {
    let args = GateArgs::parse();
    stratnews::telemetry::init(args.global.verbose);

    let mut config = PipelineConfig::from_env();
    if let Some(url) = args.global.database_url.clone() {
        config.database_url = url;
    }
    if let Some(path) = args.global.actors_csv.clone() {
        config.actors_csv_path = path;
    }
    let batch_size = args.batch_size.unwrap_or(config.gate_batch_size);

    let pool = store::connect(&config.database_url, 1).await?;

    if args.pending {
        let titles = store::TitleStore::new(pool);
        let count = titles.count_pending().await?;
        println!("{count} titles pending gate evaluation");
        return Ok(());
    }

    let records = loader::load_actor_aliases(std::path::Path::new(&config.actors_csv_path))?;
    let matcher = Arc::new(ActorMatcher::build(&records));
    info!(entities = records.len(), "actor vocabulary loaded");

    let gate = StrategicGate::new(pool, matcher, batch_size);

    let mut stats = GateStats::default();
    let mut offset = 0i64;
    let mut interrupted = false;

    loop {
        if let Some(max) = args.max_batches {
            if stats.batches >= max {
                break;
            }
        }

        tokio::select! {
            result = gate.run_batch(offset) => {
                match result {
                    Ok(outcome) if outcome.read == 0 => break,
                    Ok(outcome) => {
                        stats.accumulate(&outcome);
                        stats.batches += 1;
                        offset += batch_size;
                        info!(
                            batch = stats.batches,
                            read = outcome.read,
                            kept = outcome.kept,
                            running_processed = stats.processed,
                            running_kept = stats.kept,
                            "gate batch complete",
                        );
                    }
                    Err(e) => {
                        stats.errors += 1;
                        stats.batches += 1;
                        offset += batch_size;
                        error!(batch = stats.batches, error = %e, "gate batch failed");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("gate interrupted by operator");
                interrupted = true;
            }
        }

        if interrupted {
            break;
        }
    }

    if interrupted {
        std::process::exit(130);
    }

    println!(
        "GATE_RESULT: {}/{} kept, {} actor_hit, {} below_threshold",
        stats.kept, stats.processed, stats.actor_hit, stats.no_actor
    );

    std::process::exit(if stats.errors == 0 { 0 } else { 1 });
}
