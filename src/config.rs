//! Process-wide pipeline configuration.
//!
//! Unlike the original implementation's module-level config singleton, this
//! is an immutable record built once in each binary's `main` and passed by
//! reference into the component constructors that need it (`ingest`,
//! `gate`, `bucket`). Every field has an environment-variable source with a
//! CLI-flag override point in `cli`.

use std::env;
use std::time::Duration;

/// Tunables shared across the ingest, gate, and bucket stages.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub database_url: String,
    pub actors_csv_path: String,

    /// Retry attempts per feed fetch (HTTP 5xx / network errors).
    pub http_retries: u32,
    /// Per-request timeout.
    pub http_timeout: Duration,
    /// Base delay for exponential backoff between retries.
    pub http_retry_base_delay: Duration,

    /// Slack window tolerating feed reordering when applying the watermark rule.
    pub lookback_days: i64,
    /// Optional cap on items emitted per feed per run.
    pub max_items_per_feed: Option<usize>,
    /// Max feeds fetched concurrently by the ingestion driver.
    pub ingest_concurrency: usize,

    /// Batch size for the strategic gate.
    pub gate_batch_size: i64,

    /// Bucket time window, in hours, looking back from now.
    pub bucket_window_hours: i64,
    /// Maximum intra-bucket time span, in hours.
    pub bucket_max_span_hours: i64,
    /// Minimum members for a bucket to be persisted.
    pub bucket_min_size: usize,
    /// Maximum actors retained in a bucket key.
    pub bucket_max_actors: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            actors_csv_path: "data/actors.csv".to_string(),
            http_retries: 3,
            http_timeout: Duration::from_secs(30),
            http_retry_base_delay: Duration::from_secs(1),
            lookback_days: 1,
            max_items_per_feed: None,
            ingest_concurrency: 4,
            gate_batch_size: 500,
            bucket_window_hours: 72,
            bucket_max_span_hours: 72,
            bucket_min_size: 2,
            bucket_max_actors: 4,
        }
    }
}

impl PipelineConfig {
    /// Build a config from the process environment, falling back to defaults.
    ///
    /// `DATABASE_URL` and `ACTORS_CSV_PATH` are the only variables without a
    /// workable default; callers should override them with CLI flags where
    /// the binary exposes one (see `cli::GlobalArgs`).
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            database_url: env::var("DATABASE_URL").unwrap_or_default(),
            actors_csv_path: env::var("ACTORS_CSV_PATH").unwrap_or(defaults.actors_csv_path),
            http_retries: env_parsed("STRATNEWS_HTTP_RETRIES").unwrap_or(defaults.http_retries),
            http_timeout: env_parsed("STRATNEWS_HTTP_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.http_timeout),
            http_retry_base_delay: defaults.http_retry_base_delay,
            lookback_days: env_parsed("STRATNEWS_LOOKBACK_DAYS").unwrap_or(defaults.lookback_days),
            max_items_per_feed: env_parsed("STRATNEWS_MAX_ITEMS_PER_FEED"),
            ingest_concurrency: env_parsed("STRATNEWS_INGEST_CONCURRENCY")
                .unwrap_or(defaults.ingest_concurrency),
            gate_batch_size: env_parsed("STRATNEWS_GATE_BATCH_SIZE")
                .unwrap_or(defaults.gate_batch_size),
            bucket_window_hours: env_parsed("STRATNEWS_BUCKET_WINDOW_HOURS")
                .unwrap_or(defaults.bucket_window_hours),
            bucket_max_span_hours: env_parsed("STRATNEWS_BUCKET_MAX_SPAN_HOURS")
                .unwrap_or(defaults.bucket_max_span_hours),
            bucket_min_size: env_parsed("STRATNEWS_BUCKET_MIN_SIZE")
                .unwrap_or(defaults.bucket_min_size),
            bucket_max_actors: env_parsed("STRATNEWS_BUCKET_MAX_ACTORS")
                .unwrap_or(defaults.bucket_max_actors),
        }
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
