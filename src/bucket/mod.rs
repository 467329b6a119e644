//! The Bucket Manager: groups recently gated titles into time-bounded
//! clusters keyed by co-occurring actor sets.
//!
//! Grounded on `original_source/apps/clust2/bucket_manager.py`'s
//! `BucketManager.group_titles_by_actor_sets` / `create_bucket_from_group` /
//! `create_buckets_from_recent_titles`: per-title actor extraction,
//! sorted/truncated bucket-key grouping, window-span rejection, and
//! idempotent `bucket_id` insertion.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use md5::{Digest, Md5};
use sqlx::PgPool;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::store::buckets::{BucketStore, NewBucket};
use crate::store::titles::{GatedTitle, TitleStore};
use crate::vocab::ActorMatcher;

/// A grouped, windowed, not-yet-persisted bucket.
#[derive(Debug, Clone)]
pub struct BucketCandidate {
    pub bucket_id: String,
    pub bucket_key: String,
    pub actors: Vec<String>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub member_ids: Vec<Uuid>,
}

impl BucketCandidate {
    /// MD5 hex over the sorted, pipe-joined member UUID strings.
    pub fn members_checksum(&self) -> String {
        members_checksum(&self.member_ids)
    }
}

/// MD5 hex over `sorted(member_uuids).join("|")`, the format named in the
/// spec's checksum invariant.
pub fn members_checksum(member_ids: &[Uuid]) -> String {
    let mut strings: Vec<String> = member_ids.iter().map(Uuid::to_string).collect();
    strings.sort();
    let joined = strings.join("|");
    let digest = Md5::digest(joined.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Build the sorted, truncated, hyphen-joined bucket key from a title's
/// (deduplicated, unsorted) actor hit list. Returns `None` if the title
/// mentions no actors — such titles are dropped per the spec.
fn bucket_key(actor_hits: &[String], max_actors: usize) -> Option<String> {
    if actor_hits.is_empty() {
        return None;
    }
    let mut codes: Vec<String> = actor_hits.to_vec();
    codes.sort();
    codes.truncate(max_actors);
    Some(codes.join("-"))
}

/// Results and timing from one `BucketManager::run` invocation.
#[derive(Debug, Clone, Default)]
pub struct BucketStats {
    pub candidates: usize,
    pub inserted: usize,
    pub skipped: usize,
    pub duration: Duration,
}

pub struct BucketManager {
    titles: TitleStore,
    buckets: BucketStore,
    matcher: Arc<ActorMatcher>,
    window_hours: i64,
    max_span_hours: i64,
    min_size: usize,
    max_actors: usize,
}

impl BucketManager {
    pub fn new(pool: PgPool, matcher: Arc<ActorMatcher>, config: &PipelineConfig) -> Self {
        Self {
            titles: TitleStore::new(pool.clone()),
            buckets: BucketStore::new(pool),
            matcher,
            window_hours: config.bucket_window_hours,
            max_span_hours: config.bucket_max_span_hours,
            min_size: config.bucket_min_size,
            max_actors: config.bucket_max_actors,
        }
    }

    /// Select candidates, group them into buckets, and persist any not
    /// already present (idempotent on `bucket_id`). `dry_run` computes
    /// candidates but writes nothing.
    pub async fn run(&self, dry_run: bool) -> Result<BucketStats, PipelineError> {
        let started = Instant::now();
        let since = Utc::now() - chrono::Duration::hours(self.window_hours);
        let rows = self.titles.fetch_bucket_candidates(since).await?;

        let candidates = self.build_candidates(rows);

        let mut inserted = 0usize;
        let mut skipped = 0usize;
        if !dry_run {
            for candidate in &candidates {
                let new_bucket = NewBucket {
                    bucket_id: candidate.bucket_id.clone(),
                    date_window_start: candidate.window_start,
                    date_window_end: candidate.window_end,
                    top_actors: candidate.actors.clone(),
                    members_count: candidate.member_ids.len() as i32,
                    members_checksum: candidate.members_checksum(),
                    member_title_ids: candidate.member_ids.clone(),
                };
                if self.buckets.insert(&new_bucket).await? {
                    inserted += 1;
                } else {
                    skipped += 1;
                }
            }
        }

        Ok(BucketStats {
            candidates: candidates.len(),
            inserted,
            skipped,
            duration: started.elapsed(),
        })
    }

    /// Per-title actor extraction, grouping by bucket key, and window/size
    /// rejection. Group order follows first occurrence in `rows` (which
    /// arrive `pubdate_utc DESC`); member order within a group preserves
    /// that same input ordering.
    fn build_candidates(&self, rows: Vec<GatedTitle>) -> Vec<BucketCandidate> {
        let mut order: Vec<String> = Vec::new();
        let mut groups: HashMap<String, Vec<(Uuid, DateTime<Utc>)>> = HashMap::new();

        for row in rows {
            let Some(pubdate) = row.pubdate_utc else {
                continue;
            };
            let text = if row.title_norm.is_empty() { &row.title_display } else { &row.title_norm };
            let hits = self.matcher.all_hits(text, row.gate_actor_hit.as_deref());
            let Some(key) = bucket_key(&hits, self.max_actors) else {
                continue;
            };

            groups.entry(key.clone()).or_insert_with(|| {
                order.push(key.clone());
                Vec::new()
            });
            groups.get_mut(&key).unwrap().push((row.id, pubdate));
        }

        let mut candidates = Vec::new();
        for key in order {
            let members = &groups[&key];
            if members.len() < self.min_size {
                continue;
            }

            let window_start = members.iter().map(|(_, t)| *t).min().unwrap();
            let window_end = members.iter().map(|(_, t)| *t).max().unwrap();
            let span_hours = (window_end - window_start).num_hours();
            if span_hours > self.max_span_hours {
                continue;
            }

            let actors: Vec<String> = key.split('-').map(str::to_string).collect();
            let bucket_id = format!("B-{}-{}", window_start.format("%Y-%m-%d"), key);
            let member_ids: Vec<Uuid> = members.iter().map(|(id, _)| *id).collect();

            candidates.push(BucketCandidate {
                bucket_id,
                bucket_key: key,
                actors,
                window_start,
                window_end,
                member_ids,
            });
        }

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_key_sorts_truncates_and_joins() {
        let hits = vec!["US".to_string(), "CN".to_string(), "RU".to_string(), "IR".to_string()];
        assert_eq!(bucket_key(&hits, 3), Some("CN-IR-RU".to_string()));
    }

    #[test]
    fn bucket_key_none_for_empty_hits() {
        assert_eq!(bucket_key(&[], 4), None);
    }

    #[test]
    fn members_checksum_is_order_independent() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let forward = members_checksum(&[a, b]);
        let backward = members_checksum(&[b, a]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn members_checksum_matches_manual_md5() {
        let a = Uuid::parse_str("00000000-0000-0000-0000-000000000001").unwrap();
        let b = Uuid::parse_str("00000000-0000-0000-0000-000000000002").unwrap();
        let mut strings = vec![a.to_string(), b.to_string()];
        strings.sort();
        let expected = {
            let digest = Md5::digest(strings.join("|").as_bytes());
            digest.iter().map(|x| format!("{x:02x}")).collect::<String>()
        };
        assert_eq!(members_checksum(&[a, b]), expected);
    }
}
