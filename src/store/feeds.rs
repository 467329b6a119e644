//! Feed state: cached conditional-request validators and the publication
//! watermark, owned exclusively by the ingest stage.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::PipelineError;

/// A feed's persisted state, read before each fetch to compose conditional
/// request headers and the watermark cutoff.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedState {
    pub url: String,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub last_pubdate_utc: Option<DateTime<Utc>>,
    pub last_run_at: Option<DateTime<Utc>>,
}

/// A feed registered for ingestion, as returned by `list_active`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedRegistration {
    pub url: String,
    pub name: Option<String>,
    pub max_items_override: Option<i32>,
}

/// Feed/title counts for the `--summary` driver flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedSummary {
    pub total: i64,
    pub active: i64,
}

#[derive(Clone)]
pub struct FeedStore {
    pool: PgPool,
}

impl FeedStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Load a feed's state, creating a blank row on first sight.
    pub async fn get_or_create(&self, url: &str) -> Result<FeedState, PipelineError> {
        if let Some(state) = self.get(url).await? {
            return Ok(state);
        }

        sqlx::query_as::<_, FeedState>(
            r#"
            INSERT INTO feeds (url)
            VALUES ($1)
            ON CONFLICT (url) DO UPDATE SET url = EXCLUDED.url
            RETURNING url, etag, last_modified, last_pubdate_utc, last_run_at
            "#,
        )
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(PipelineError::from)
    }

    pub async fn get(&self, url: &str) -> Result<Option<FeedState>, PipelineError> {
        let row = sqlx::query_as::<_, FeedState>(
            r#"
            SELECT url, etag, last_modified, last_pubdate_utc, last_run_at
            FROM feeds
            WHERE url = $1
            "#,
        )
        .bind(url)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Persist new validators and advance the watermark after a run.
    ///
    /// `etag`/`last_modified` fall back to the previously stored value when
    /// the response omits them. `observed_max_pubdate` only ever advances
    /// `last_pubdate_utc`, never regresses it.
    pub async fn advance(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
        observed_max_pubdate: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            INSERT INTO feeds (url, etag, last_modified, last_pubdate_utc, last_run_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (url) DO UPDATE SET
                etag = COALESCE(EXCLUDED.etag, feeds.etag),
                last_modified = COALESCE(EXCLUDED.last_modified, feeds.last_modified),
                last_pubdate_utc = GREATEST(EXCLUDED.last_pubdate_utc, feeds.last_pubdate_utc),
                last_run_at = EXCLUDED.last_run_at,
                updated_at = now()
            "#,
        )
        .bind(url)
        .bind(etag)
        .bind(last_modified)
        .bind(observed_max_pubdate)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Record a 304 ("not modified") run: only the last-run timestamp moves.
    pub async fn touch_not_modified(&self, url: &str, now: DateTime<Utc>) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            UPDATE feeds SET last_run_at = $2, updated_at = now()
            WHERE url = $1
            "#,
        )
        .bind(url)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Active feeds ordered by descending priority then name, the list the
    /// ingestion driver iterates each run.
    pub async fn list_active(&self) -> Result<Vec<FeedRegistration>, PipelineError> {
        let rows = sqlx::query_as::<_, FeedRegistration>(
            r#"
            SELECT url, name, max_items_override
            FROM feeds
            WHERE is_active = true
            ORDER BY priority DESC, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Register a feed as active, seeding it if unseen. Used to bootstrap
    /// `feeds` from a `--feeds-file` when the table is otherwise empty.
    pub async fn register(&self, url: &str, name: Option<&str>) -> Result<(), PipelineError> {
        sqlx::query(
            r#"
            INSERT INTO feeds (url, name, is_active)
            VALUES ($1, $2, true)
            ON CONFLICT (url) DO UPDATE SET
                name = COALESCE(EXCLUDED.name, feeds.name),
                is_active = true
            "#,
        )
        .bind(url)
        .bind(name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Total and active feed counts, for `--summary`.
    pub async fn summary(&self) -> Result<FeedSummary, PipelineError> {
        let row: (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COUNT(*) FILTER (WHERE is_active) FROM feeds",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(FeedSummary { total: row.0, active: row.1 })
    }
}
