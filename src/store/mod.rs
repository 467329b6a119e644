//! Relational persistence for feeds, titles, and buckets.
//!
//! Grounded on `fourthplaces-rootsignal`'s `modules/rootsignal-archive/src/store.rs`:
//! one struct per owning stage, wrapping a shared `PgPool`, with `sqlx::FromRow`
//! row types and explicit bind-parameter structs for inserts.

pub mod buckets;
pub mod feeds;
pub mod pool;
pub mod titles;

pub use buckets::BucketStore;
pub use feeds::{FeedRegistration, FeedStore, FeedSummary};
pub use pool::connect;
pub use titles::{TitleStore, TitleSummary};
