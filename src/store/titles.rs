//! Title rows: inserted by the ingest stage as `pending`, transitioned to
//! `gated` exactly once by the strategic gate, read-only thereafter.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PipelineError;

/// A fully persisted title row.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Title {
    pub id: Uuid,
    pub feed_id: String,
    pub title_original: String,
    pub title_display: String,
    pub title_norm: String,
    pub url_gnews: Option<String>,
    pub publisher_name: Option<String>,
    pub publisher_domain: Option<String>,
    pub pubdate_utc: Option<DateTime<Utc>>,
    pub detected_language: Option<String>,
    pub language_confidence: Option<f64>,
    pub content_hash: String,
    pub processing_status: String,
    pub gate_keep: Option<bool>,
    pub gate_reason: Option<String>,
    pub gate_score: Option<f64>,
    pub gate_actor_hit: Option<String>,
    pub gate_at: Option<DateTime<Utc>>,
}

/// A title not yet persisted, produced by the ingest stage's per-entry
/// extraction pipeline.
#[derive(Debug, Clone)]
pub struct NewTitle {
    pub feed_id: String,
    pub title_original: String,
    pub title_display: String,
    pub title_norm: String,
    pub url_gnews: Option<String>,
    pub publisher_name: Option<String>,
    pub publisher_domain: Option<String>,
    pub pubdate_utc: Option<DateTime<Utc>>,
    pub detected_language: Option<String>,
    pub language_confidence: Option<f64>,
    pub content_hash: String,
}

/// Outcome of a single insert attempt against the `(content_hash, feed_id)`
/// uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Skipped,
}

/// Gate decision fields applied to a batch of pending rows.
#[derive(Debug, Clone)]
pub struct GateOutcome {
    pub id: Uuid,
    pub gate_keep: bool,
    pub gate_reason: &'static str,
    pub gate_score: f64,
    pub gate_actor_hit: Option<String>,
}

/// A row eligible for gating: only the fields the gate actually needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingTitle {
    pub id: Uuid,
    pub title_norm: String,
    pub title_display: String,
}

/// A row eligible for bucketing: only the fields the bucket manager needs.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GatedTitle {
    pub id: Uuid,
    pub title_norm: String,
    pub title_display: String,
    pub pubdate_utc: Option<DateTime<Utc>>,
    pub gate_actor_hit: Option<String>,
}

/// Title counts by processing status, for `--summary`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TitleSummary {
    pub total: i64,
    pub pending: i64,
    pub gated: i64,
}

#[derive(Clone)]
pub struct TitleStore {
    pool: PgPool,
}

impl TitleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert one candidate title. A `(content_hash, feed_id)` conflict is
    /// not an error: it reports as `Skipped`. Intended to run inside a
    /// caller-managed transaction alongside sibling inserts for the batch.
    pub async fn insert(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        candidate: &NewTitle,
    ) -> Result<InsertOutcome, PipelineError> {
        let result = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO titles
                (feed_id, title_original, title_display, title_norm, url_gnews,
                 publisher_name, publisher_domain, pubdate_utc, detected_language,
                 language_confidence, content_hash, processing_status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, 'pending')
            ON CONFLICT (content_hash, feed_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&candidate.feed_id)
        .bind(&candidate.title_original)
        .bind(&candidate.title_display)
        .bind(&candidate.title_norm)
        .bind(&candidate.url_gnews)
        .bind(&candidate.publisher_name)
        .bind(&candidate.publisher_domain)
        .bind(candidate.pubdate_utc)
        .bind(&candidate.detected_language)
        .bind(candidate.language_confidence)
        .bind(&candidate.content_hash)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(match result {
            Some(_) => InsertOutcome::Inserted,
            None => InsertOutcome::Skipped,
        })
    }

    /// Begin a transaction for a batch of inserts belonging to one feed.
    pub async fn begin(&self) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, PipelineError> {
        Ok(self.pool.begin().await?)
    }

    /// Total/pending/gated counts, for `--summary`.
    pub async fn summary(&self) -> Result<TitleSummary, PipelineError> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE processing_status = 'pending'),
                COUNT(*) FILTER (WHERE processing_status = 'gated')
            FROM titles
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(TitleSummary { total: row.0, pending: row.1, gated: row.2 })
    }

    /// Count rows still awaiting gate evaluation.
    pub async fn count_pending(&self) -> Result<i64, PipelineError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM titles WHERE processing_status = 'pending' AND gate_at IS NULL",
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Fetch up to `limit` pending, ungated rows ordered newest-first,
    /// offset-paginated by the caller across outer batch iterations.
    pub async fn fetch_pending(&self, limit: i64, offset: i64) -> Result<Vec<PendingTitle>, PipelineError> {
        let rows = sqlx::query_as::<_, PendingTitle>(
            r#"
            SELECT id, title_norm, title_display
            FROM titles
            WHERE processing_status = 'pending' AND gate_at IS NULL
            ORDER BY pubdate_utc DESC, id
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Apply gate outcomes to a batch of rows within a single transaction.
    pub async fn apply_gate_batch(&self, outcomes: &[GateOutcome]) -> Result<(), PipelineError> {
        let mut tx = self.pool.begin().await?;
        for outcome in outcomes {
            sqlx::query(
                r#"
                UPDATE titles SET
                    processing_status = 'gated',
                    gate_keep = $2,
                    gate_reason = $3,
                    gate_score = $4,
                    gate_actor_hit = $5,
                    gate_at = now()
                WHERE id = $1
                "#,
            )
            .bind(outcome.id)
            .bind(outcome.gate_keep)
            .bind(outcome.gate_reason)
            .bind(outcome.gate_score)
            .bind(&outcome.gate_actor_hit)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Titles kept by the gate within the bucket manager's lookback window.
    pub async fn fetch_bucket_candidates(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<GatedTitle>, PipelineError> {
        let rows = sqlx::query_as::<_, GatedTitle>(
            r#"
            SELECT id, title_norm, title_display, pubdate_utc, gate_actor_hit
            FROM titles
            WHERE gate_keep = true AND pubdate_utc IS NOT NULL AND pubdate_utc >= $1
            ORDER BY pubdate_utc DESC
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
