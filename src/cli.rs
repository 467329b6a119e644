//! Shared CLI argument definitions for the three driver binaries.
//!
//! Follows the teacher crate's pattern: one `#[derive(Args)]` struct per
//! binary's flags, a `GlobalArgs` flattened into every binary for verbosity
//! counting, and connection/vocabulary overrides that fall back to
//! `config::PipelineConfig::from_env()` when omitted.

use std::path::PathBuf;

use clap::Args;

/// Flags shared by `ingest_driver`, `gate_driver`, and `bucket_driver`.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Postgres connection string (falls back to DATABASE_URL)
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// Path to the actor-alias vocabulary CSV (falls back to ACTORS_CSV_PATH)
    #[arg(long, global = true)]
    pub actors_csv: Option<String>,
}

/// `ingest_driver`: polls configured feeds, normalizes and dedups titles.
#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Maximum number of active feeds to process (default: all)
    #[arg(long)]
    pub max_feeds: Option<usize>,

    /// Print the database summary (feed/title counts) and exit without fetching
    #[arg(long)]
    pub summary: bool,

    /// Path to a newline-delimited file of feed URLs, used when the feeds
    /// table has no rows registered yet (seeds them as active on first run)
    #[arg(long)]
    pub feeds_file: Option<PathBuf>,
}

/// `gate_driver`: batches pending titles through the Strategic Gate.
#[derive(Args, Debug, Clone)]
pub struct GateArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Rows read per batch (falls back to config.gate_batch_size)
    #[arg(long)]
    pub batch_size: Option<i64>,

    /// Maximum number of batches to run before stopping (default: until empty)
    #[arg(long)]
    pub max_batches: Option<u64>,

    /// Print a one-line run summary
    #[arg(long)]
    pub summary: bool,

    /// Print the count of currently pending, ungated rows and exit
    #[arg(long)]
    pub pending: bool,
}

/// `bucket_driver`: groups recently gated titles into actor-set buckets.
#[derive(Args, Debug, Clone)]
pub struct BucketArgs {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Lookback window in hours (falls back to config.bucket_window_hours)
    #[arg(long)]
    pub hours: Option<i64>,

    /// Compute candidate buckets but do not write anything
    #[arg(long)]
    pub dry_run: bool,

    /// Print a one-line run summary
    #[arg(long)]
    pub summary: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct IngestCli {
        #[command(flatten)]
        args: IngestArgs,
    }

    #[derive(Parser)]
    struct GateCli {
        #[command(flatten)]
        args: GateArgs,
    }

    #[test]
    fn ingest_args_parse_max_feeds() {
        let cli = IngestCli::try_parse_from(["ingest_driver", "--max-feeds", "5"]).unwrap();
        assert_eq!(cli.args.max_feeds, Some(5));
    }

    #[test]
    fn gate_args_parse_batch_size_and_verbosity() {
        let cli = GateCli::try_parse_from(["gate_driver", "-vv", "--batch-size", "250"]).unwrap();
        assert_eq!(cli.args.batch_size, Some(250));
        assert_eq!(cli.args.global.verbose, 2);
    }

    #[test]
    fn bucket_args_default_is_not_dry_run() {
        #[derive(Parser)]
        struct BucketCli {
            #[command(flatten)]
            args: BucketArgs,
        }
        let cli = BucketCli::try_parse_from(["bucket_driver"]).unwrap();
        assert!(!cli.args.dry_run);
        assert_eq!(cli.args.hours, None);
    }
}
