//! The Strategic Gate: batch-evaluates pending titles against the actor
//! vocabulary and records the keep/drop decision.
//!
//! Grounded on `original_source/apps/clust1/strategic_gate.py`'s
//! `StrategicGate.process_batch`, driven by `apps/clust1/run_gate.py`'s
//! `GateProcessor`: offset-paginated batches, one decision per title, one
//! transaction per batch.

use std::sync::Arc;

use sqlx::PgPool;

use crate::error::PipelineError;
use crate::store::titles::{GateOutcome, TitleStore};
use crate::vocab::ActorMatcher;

/// The gate's keep/drop decision for a single title, before an `id` is
/// attached for persistence.
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub keep: bool,
    pub reason: &'static str,
    pub score: f64,
    pub actor_hit: Option<String>,
}

/// Evaluate one title's gate decision. Falls back to `title_display` when
/// `title_norm` is empty. `anchor_labels`/`anchor_scores` are not modeled
/// here — they are fixed to empty lists at the storage layer for legacy
/// schema compatibility, per the spec.
pub fn decide(matcher: &ActorMatcher, title_norm: &str, title_display: &str) -> GateDecision {
    let text = if title_norm.is_empty() { title_display } else { title_norm };
    match matcher.first_hit(text) {
        Some(code) => GateDecision {
            keep: true,
            reason: "actor_hit",
            score: 0.99,
            actor_hit: Some(code),
        },
        None => GateDecision {
            keep: false,
            reason: "no_actor",
            score: 0.0,
            actor_hit: None,
        },
    }
}

/// Outcome of a single batch read-decide-update cycle.
#[derive(Debug, Clone, Default)]
pub struct BatchOutcome {
    pub read: usize,
    pub kept: usize,
    pub actor_hit: usize,
    pub no_actor: usize,
}

/// Running totals across a gate driver invocation.
#[derive(Debug, Clone, Default)]
pub struct GateStats {
    pub batches: u64,
    pub processed: u64,
    pub kept: u64,
    pub actor_hit: u64,
    pub no_actor: u64,
    pub errors: u64,
}

impl GateStats {
    pub fn accumulate(&mut self, outcome: &BatchOutcome) {
        self.processed += outcome.read as u64;
        self.kept += outcome.kept as u64;
        self.actor_hit += outcome.actor_hit as u64;
        self.no_actor += outcome.no_actor as u64;
    }
}

/// Batch processor over pending titles. Single-worker by design: see the
/// concurrency notes in the module-level spec about `SELECT ... FOR UPDATE
/// SKIP LOCKED` being required for multi-worker safety, which this does
/// not implement.
pub struct StrategicGate {
    titles: TitleStore,
    matcher: Arc<ActorMatcher>,
    batch_size: i64,
}

impl StrategicGate {
    pub fn new(pool: PgPool, matcher: Arc<ActorMatcher>, batch_size: i64) -> Self {
        Self {
            titles: TitleStore::new(pool),
            matcher,
            batch_size,
        }
    }

    /// Number of rows still pending gate evaluation.
    pub async fn pending_count(&self) -> Result<i64, PipelineError> {
        self.titles.count_pending().await
    }

    /// Read, decide, and persist one batch starting at `offset`. A batch
    /// with zero rows read signals the caller to stop iterating.
    pub async fn run_batch(&self, offset: i64) -> Result<BatchOutcome, PipelineError> {
        let rows = self.titles.fetch_pending(self.batch_size, offset).await?;
        if rows.is_empty() {
            return Ok(BatchOutcome::default());
        }

        let mut outcomes = Vec::with_capacity(rows.len());
        let mut outcome = BatchOutcome {
            read: rows.len(),
            ..Default::default()
        };

        for row in &rows {
            let decision = decide(&self.matcher, &row.title_norm, &row.title_display);
            if decision.keep {
                outcome.kept += 1;
                outcome.actor_hit += 1;
            } else {
                outcome.no_actor += 1;
            }
            outcomes.push(GateOutcome {
                id: row.id,
                gate_keep: decision.keep,
                gate_reason: decision.reason,
                gate_score: decision.score,
                gate_actor_hit: decision.actor_hit,
            });
        }

        self.titles.apply_gate_batch(&outcomes).await?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vocab::loader::ActorRecord;

    fn matcher() -> ActorMatcher {
        ActorMatcher::build(&[
            ActorRecord { code: "EU".into(), aliases: vec!["European Union".into(), "EU".into()] },
            ActorRecord { code: "IR".into(), aliases: vec!["Iran".into()] },
        ])
    }

    #[test]
    fn actor_hit_produces_keep_true_and_fixed_score() {
        let m = matcher();
        let d = decide(&m, "eu imposes sanctions on iranian officials", "");
        assert!(d.keep);
        assert_eq!(d.reason, "actor_hit");
        assert_eq!(d.score, 0.99);
        assert!(matches!(d.actor_hit.as_deref(), Some("EU") | Some("IR")));
    }

    #[test]
    fn no_actor_produces_keep_false_and_zero_score() {
        let m = matcher();
        let d = decide(&m, "visitors flock to the museum reopening", "");
        assert!(!d.keep);
        assert_eq!(d.reason, "no_actor");
        assert_eq!(d.score, 0.0);
        assert_eq!(d.actor_hit, None);
    }

    #[test]
    fn falls_back_to_title_display_when_norm_is_empty() {
        let m = matcher();
        let d = decide(&m, "", "a statement from the European Union today");
        assert!(d.keep);
    }

    #[test]
    fn decision_is_deterministic_across_repeated_calls() {
        let m = matcher();
        let text = "eu sanctions iran";
        let a = decide(&m, text, "");
        let b = decide(&m, text, "");
        assert_eq!(a, b);
    }
}
