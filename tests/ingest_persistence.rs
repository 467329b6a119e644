//! Integration tests for title insertion idempotency and feed-state
//! advancement, run against a throwaway Postgres database per test.

use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use stratnews::store::feeds::FeedStore;
use stratnews::store::titles::{NewTitle, TitleStore};

fn candidate(feed_id: &str, norm: &str) -> NewTitle {
    NewTitle {
        feed_id: feed_id.to_string(),
        title_original: norm.to_string(),
        title_display: norm.to_string(),
        title_norm: norm.to_string(),
        url_gnews: None,
        publisher_name: Some("Reuters".to_string()),
        publisher_domain: Some("reuters.com".to_string()),
        pubdate_utc: Some(Utc.with_ymd_and_hms(2026, 7, 20, 12, 0, 0).unwrap()),
        detected_language: Some("en".to_string()),
        language_confidence: Some(0.95),
        content_hash: format!("hash-{norm}"),
    }
}

#[sqlx::test(migrations = "./migrations")]
async fn duplicate_content_hash_is_skipped_not_errored(pool: PgPool) {
    FeedStore::new(pool.clone()).get_or_create("https://example.com/feed").await.unwrap();

    let titles = TitleStore::new(pool);
    let mut tx = titles.begin().await.unwrap();

    let first = titles.insert(&mut tx, &candidate("https://example.com/feed", "eu sanctions iran")).await.unwrap();
    let second = titles.insert(&mut tx, &candidate("https://example.com/feed", "eu sanctions iran")).await.unwrap();
    tx.commit().await.unwrap();

    use stratnews::store::titles::InsertOutcome;
    assert_eq!(first, InsertOutcome::Inserted);
    assert_eq!(second, InsertOutcome::Skipped);

    let summary = titles.summary().await.unwrap();
    assert_eq!(summary.total, 1);
    assert_eq!(summary.pending, 1);
}

#[sqlx::test(migrations = "./migrations")]
async fn same_hash_different_feed_both_insert(pool: PgPool) {
    let feeds = FeedStore::new(pool.clone());
    feeds.get_or_create("https://a.example.com/feed").await.unwrap();
    feeds.get_or_create("https://b.example.com/feed").await.unwrap();

    let titles = TitleStore::new(pool);
    let mut tx = titles.begin().await.unwrap();

    let a = titles.insert(&mut tx, &candidate("https://a.example.com/feed", "shared title")).await.unwrap();
    let b = titles.insert(&mut tx, &candidate("https://b.example.com/feed", "shared title")).await.unwrap();
    tx.commit().await.unwrap();

    use stratnews::store::titles::InsertOutcome;
    assert_eq!(a, InsertOutcome::Inserted);
    assert_eq!(b, InsertOutcome::Inserted);
}

#[sqlx::test(migrations = "./migrations")]
async fn feed_watermark_only_advances_forward(pool: PgPool) {
    let feeds = FeedStore::new(pool);
    let url = "https://example.com/feed";

    let early = Utc.with_ymd_and_hms(2026, 7, 10, 0, 0, 0).unwrap();
    let late = Utc.with_ymd_and_hms(2026, 7, 20, 0, 0, 0).unwrap();

    feeds.advance(url, Some("etag-1"), None, Some(late), Utc.with_ymd_and_hms(2026, 7, 20, 1, 0, 0).unwrap()).await.unwrap();
    feeds.advance(url, None, None, Some(early), Utc.with_ymd_and_hms(2026, 7, 21, 1, 0, 0).unwrap()).await.unwrap();

    let state = feeds.get(url).await.unwrap().unwrap();
    assert_eq!(state.last_pubdate_utc, Some(late));
    // etag falls back to the previously stored value when a later run omits it.
    assert_eq!(state.etag.as_deref(), Some("etag-1"));
}

#[sqlx::test(migrations = "./migrations")]
async fn not_modified_run_only_touches_last_run_at(pool: PgPool) {
    let feeds = FeedStore::new(pool);
    let url = "https://example.com/feed";
    feeds.get_or_create(url).await.unwrap();

    let now = Utc.with_ymd_and_hms(2026, 7, 20, 12, 0, 0).unwrap();
    feeds.touch_not_modified(url, now).await.unwrap();

    let state = feeds.get(url).await.unwrap().unwrap();
    assert_eq!(state.last_run_at, Some(now));
    assert_eq!(state.last_pubdate_utc, None);
}
