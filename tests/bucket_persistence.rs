//! Integration tests for bucket formation and idempotent persistence
//! against a throwaway Postgres database.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;

use stratnews::bucket::{members_checksum, BucketManager};
use stratnews::config::PipelineConfig;
use stratnews::vocab::{ActorMatcher, ActorRecord};

fn matcher() -> Arc<ActorMatcher> {
    Arc::new(ActorMatcher::build(&[
        ActorRecord { code: "US".into(), aliases: vec!["United States".into(), "US".into()] },
        ActorRecord { code: "CN".into(), aliases: vec!["China mainland".into(), "Beijing".into()] },
    ]))
}

fn config() -> PipelineConfig {
    PipelineConfig {
        bucket_window_hours: 72,
        bucket_max_span_hours: 72,
        bucket_min_size: 2,
        bucket_max_actors: 4,
        ..PipelineConfig::default()
    }
}

/// Insert a title already in the `gated`/kept state, as the strategic
/// gate would leave it, bypassing the gate to isolate the bucket manager.
async fn seed_gated_title(pool: &PgPool, title_norm: &str, pubdate: DateTime<Utc>, actor_hit: &str) {
    sqlx::query("INSERT INTO feeds (url) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind("https://feed.example.com")
        .execute(pool)
        .await
        .unwrap();

    sqlx::query(
        r#"
        INSERT INTO titles
            (feed_id, title_original, title_display, title_norm, content_hash,
             pubdate_utc, processing_status, gate_keep, gate_reason, gate_score,
             gate_actor_hit, gate_at)
        VALUES ($1, $2, $2, $2, $3, $4, 'gated', true, 'actor_hit', 0.99, $5, now())
        "#,
    )
    .bind("https://feed.example.com")
    .bind(title_norm)
    .bind(format!("hash-{title_norm}"))
    .bind(pubdate)
    .bind(actor_hit)
    .execute(pool)
    .await
    .unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn three_titles_within_window_form_one_bucket(pool: PgPool) {
    let base = Utc.with_ymd_and_hms(2026, 7, 20, 0, 0, 0).unwrap();
    seed_gated_title(&pool, "united states warns china mainland over taiwan tensions", base, "US").await;
    seed_gated_title(&pool, "china mainland responds firmly to united states demands", base + chrono::Duration::hours(20), "CN").await;
    seed_gated_title(&pool, "beijing summons united states envoy over taiwan statement", base + chrono::Duration::hours(40), "CN").await;

    let manager = BucketManager::new(pool, matcher(), &config());
    let stats = manager.run(false).await.unwrap();

    assert_eq!(stats.candidates, 1);
    assert_eq!(stats.inserted, 1);
    assert_eq!(stats.skipped, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn rerun_on_unchanged_candidates_skips_duplicate_bucket_id(pool: PgPool) {
    let base = Utc.with_ymd_and_hms(2026, 7, 20, 0, 0, 0).unwrap();
    seed_gated_title(&pool, "united states warns china mainland over taiwan tensions", base, "US").await;
    seed_gated_title(&pool, "china mainland responds firmly to united states demands", base + chrono::Duration::hours(10), "CN").await;

    let manager = BucketManager::new(pool, matcher(), &config());
    let first = manager.run(false).await.unwrap();
    assert_eq!(first.inserted, 1);

    let second = manager.run(false).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn below_minimum_size_group_is_dropped(pool: PgPool) {
    let base = Utc.with_ymd_and_hms(2026, 7, 20, 0, 0, 0).unwrap();
    seed_gated_title(&pool, "united states warns china over taiwan", base, "US").await;

    let manager = BucketManager::new(pool, matcher(), &config());
    let stats = manager.run(false).await.unwrap();

    assert_eq!(stats.candidates, 0);
    assert_eq!(stats.inserted, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn dry_run_computes_candidates_without_writing(pool: PgPool) {
    let base = Utc.with_ymd_and_hms(2026, 7, 20, 0, 0, 0).unwrap();
    seed_gated_title(&pool, "united states warns china mainland over taiwan tensions", base, "US").await;
    seed_gated_title(&pool, "china mainland responds firmly to united states demands", base + chrono::Duration::hours(10), "CN").await;

    let manager = BucketManager::new(pool.clone(), matcher(), &config());
    let stats = manager.run(true).await.unwrap();

    assert_eq!(stats.candidates, 1);
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.skipped, 0);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM buckets").fetch_one(&pool).await.unwrap();
    assert_eq!(count, 0);
}

#[test]
fn members_checksum_is_a_pure_function_of_member_ids() {
    let a = uuid::Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
    let b = uuid::Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap();
    assert_eq!(members_checksum(&[a, b]), members_checksum(&[b, a]));
}
