//! Integration tests for the Strategic Gate's batch read-decide-update
//! cycle against a throwaway Postgres database.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sqlx::PgPool;

use stratnews::gate::StrategicGate;
use stratnews::store::feeds::FeedStore;
use stratnews::store::titles::{NewTitle, TitleStore};
use stratnews::vocab::{ActorMatcher, ActorRecord};

fn matcher() -> Arc<ActorMatcher> {
    Arc::new(ActorMatcher::build(&[
        ActorRecord { code: "EU".into(), aliases: vec!["European Union".into(), "EU".into()] },
        ActorRecord { code: "IR".into(), aliases: vec!["Iran".into()] },
    ]))
}

async fn seed_title(pool: &PgPool, titles: &TitleStore, feed_id: &str, title_norm: &str) {
    FeedStore::new(pool.clone()).get_or_create(feed_id).await.unwrap();
    let mut tx = titles.begin().await.unwrap();
    titles
        .insert(
            &mut tx,
            &NewTitle {
                feed_id: feed_id.to_string(),
                title_original: title_norm.to_string(),
                title_display: title_norm.to_string(),
                title_norm: title_norm.to_string(),
                url_gnews: None,
                publisher_name: None,
                publisher_domain: None,
                pubdate_utc: Some(Utc.with_ymd_and_hms(2026, 7, 20, 12, 0, 0).unwrap()),
                detected_language: Some("en".to_string()),
                language_confidence: Some(0.9),
                content_hash: format!("hash-{title_norm}"),
            },
        )
        .await
        .unwrap();
    tx.commit().await.unwrap();
}

#[sqlx::test(migrations = "./migrations")]
async fn batch_marks_actor_hits_kept_and_others_dropped(pool: PgPool) {
    let titles = TitleStore::new(pool.clone());
    seed_title(&pool, &titles, "https://feed.example.com", "eu imposes sanctions on iran").await;
    seed_title(&pool, &titles, "https://feed.example.com", "museum reopens downtown").await;

    let gate = StrategicGate::new(pool, matcher(), 10);
    let outcome = gate.run_batch(0).await.unwrap();

    assert_eq!(outcome.read, 2);
    assert_eq!(outcome.kept, 1);
    assert_eq!(outcome.actor_hit, 1);
    assert_eq!(outcome.no_actor, 1);

    assert_eq!(titles.count_pending().await.unwrap(), 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn already_gated_rows_are_not_reprocessed(pool: PgPool) {
    let titles = TitleStore::new(pool.clone());
    seed_title(&pool, &titles, "https://feed.example.com", "eu sanctions iran today").await;

    let gate = StrategicGate::new(pool.clone(), matcher(), 10);
    let first = gate.run_batch(0).await.unwrap();
    assert_eq!(first.read, 1);

    let second = gate.run_batch(0).await.unwrap();
    assert_eq!(second.read, 0);
}

#[sqlx::test(migrations = "./migrations")]
async fn empty_pending_set_yields_zero_read_batch(pool: PgPool) {
    let gate = StrategicGate::new(pool, matcher(), 50);
    let outcome = gate.run_batch(0).await.unwrap();
    assert_eq!(outcome.read, 0);
    assert_eq!(outcome.kept, 0);
}
