//! Bucket persistence: one row per deterministic `bucket_id`, owned
//! exclusively by the bucket manager.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::PipelineError;

/// A candidate ready for persistence, already grouped, windowed, and
/// checksummed by the bucket manager.
#[derive(Debug, Clone)]
pub struct NewBucket {
    pub bucket_id: String,
    pub date_window_start: DateTime<Utc>,
    pub date_window_end: DateTime<Utc>,
    pub top_actors: Vec<String>,
    pub members_count: i32,
    pub members_checksum: String,
    pub member_title_ids: Vec<Uuid>,
}

#[derive(Clone)]
pub struct BucketStore {
    pool: PgPool,
}

impl BucketStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn exists(&self, bucket_id: &str) -> Result<bool, PipelineError> {
        let found: Option<Uuid> = sqlx::query_scalar("SELECT id FROM buckets WHERE bucket_id = $1")
            .bind(bucket_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(found.is_some())
    }

    /// Insert a bucket and its members inside one transaction. Returns
    /// `false` without writing anything if `bucket_id` already exists
    /// (idempotent reinsertion per the spec).
    pub async fn insert(&self, candidate: &NewBucket) -> Result<bool, PipelineError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<Uuid> = sqlx::query_scalar("SELECT id FROM buckets WHERE bucket_id = $1")
            .bind(&candidate.bucket_id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            tx.rollback().await?;
            return Ok(false);
        }

        let top_actors_json = serde_json::to_value(&candidate.top_actors)?;

        let bucket_uuid: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO buckets
                (bucket_id, date_window_start, date_window_end, top_actors,
                 members_count, members_checksum)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&candidate.bucket_id)
        .bind(candidate.date_window_start)
        .bind(candidate.date_window_end)
        .bind(&top_actors_json)
        .bind(candidate.members_count)
        .bind(&candidate.members_checksum)
        .fetch_one(&mut *tx)
        .await?;

        for title_id in &candidate.member_title_ids {
            sqlx::query(
                r#"
                INSERT INTO bucket_members (bucket_id, title_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(bucket_uuid)
            .bind(title_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}
