//! Connection pool construction and embedded migrations.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::PipelineError;

/// Connect to Postgres and run any pending migrations.
///
/// `max_connections` should track the caller's concurrency degree (feed
/// fetch fan-out for the ingest driver; 1 is sufficient for the
/// single-worker gate and bucket drivers).
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, PipelineError> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}
