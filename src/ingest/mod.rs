//! RSS/Atom ingestion: conditional fetch, parse, normalize, and idempotent
//! persistence of new titles.

pub mod fetcher;
pub mod normalize;

pub use fetcher::{FeedFetcher, FetchStats};
