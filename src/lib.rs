//! # stratnews
//!
//! A strategic-news intelligence pipeline: incremental RSS/Atom ingestion,
//! multilingual actor-alias gating, and actor-set bucketing over curated
//! publisher feeds.
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                         stratnews pipeline                       │
//! │                                                                  │
//! │  ingest ───────► gate ───────► bucket                            │
//! │    │               │              │                              │
//! │  feed-rs +       actor         time-windowed                     │
//! │  conditional     vocabulary    actor-set clusters                │
//! │  GET + dedup     matcher       + checksums                       │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each stage is a single-threaded batch worker reading its predecessor's
//! output from Postgres rather than an in-memory queue, so any stage can be
//! rerun independently. Three binaries under `src/bin/` drive the stages:
//! `ingest_driver`, `gate_driver`, `bucket_driver`.
//!
//! ## Modules
//!
//! | Module | Responsibility |
//! |--------|-----------------|
//! | [`vocab`] | Loads multilingual actor aliases and builds [`ActorMatcher`](vocab::ActorMatcher), the CJK/whole-word matcher behind `first_hit`/`all_hits` |
//! | [`ingest`] | Per-feed conditional fetch, RSS/Atom parse, title normalization, language detection, content hashing, idempotent insert |
//! | [`gate`] | The Strategic Gate: batch keep/drop decisions over pending titles |
//! | [`bucket`] | The Bucket Manager: per-title actor-set extraction, grouping, windowing, deterministic `bucket_id` + checksum |
//! | [`store`] | `sqlx`-backed persistence for feeds, titles, and buckets, one store struct per owning stage |
//! | [`config`] | Immutable `PipelineConfig`, loaded once from the environment with CLI-flag overrides |
//! | [`error`] | [`PipelineError`](error::PipelineError), one variant per failure class |
//! | [`cli`] | Shared `clap` argument definitions for the three driver binaries |
//! | [`telemetry`] | `tracing-subscriber` initialization shared by all three binaries |
//!
//! ## Library usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stratnews::vocab::{loader, ActorMatcher};
//! use stratnews::gate;
//!
//! let records = loader::load_actor_aliases("data/actors.csv".as_ref()).unwrap();
//! let matcher = Arc::new(ActorMatcher::build(&records));
//!
//! let decision = gate::decide(&matcher, "eu imposes sanctions on iranian officials", "");
//! assert!(decision.keep);
//! ```
//!
//! ## Data model
//!
//! Three relations carry the pipeline's state end to end: `feeds` (per-feed
//! conditional-request validators and publication watermark), `titles`
//! (canonical, deduplicated titles with gate outcomes), and `buckets` /
//! `bucket_members` (actor-set clusters with deterministic ids and member
//! checksums). Ownership is strict: `ingest` owns `feeds` and creates
//! `titles` rows, `gate` is the only writer that transitions
//! `processing_status`, and `bucket` is the only writer of `buckets` /
//! `bucket_members`.

pub mod bucket;
pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod ingest;
pub mod store;
pub mod telemetry;
pub mod vocab;
