//! Actor vocabulary: loading multilingual alias lists and matching them
//! against normalized text.

pub mod loader;
pub mod matcher;

pub use loader::{ActorRecord, VocabularyReport};
pub use matcher::ActorMatcher;
