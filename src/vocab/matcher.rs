//! Matches normalized text against the actor vocabulary.
//!
//! Grounded on `original_source/apps/clust1/~actor_extractor_legacy.py`'s
//! `ActorExtractor`: scripts without word boundaries (CJK, Thai) match by
//! substring, everything else matches on `\b`-anchored word boundaries so
//! that e.g. "ROK" never fires inside "brokeback".

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use super::loader::ActorRecord;

/// Unicode ranges for scripts that don't tokenize on whitespace, where a
/// `\b` boundary would never fire and a substring match is the only option.
const SUBSTRING_RANGES: [(u32, u32); 4] = [
    (0x4E00, 0x9FFF), // CJK Unified Ideographs
    (0x3040, 0x309F), // Hiragana
    (0x30A0, 0x30FF), // Katakana
    (0x0E00, 0x0E7F), // Thai
];

fn has_substring_script_chars(s: &str) -> bool {
    s.chars().any(|c| {
        let cp = c as u32;
        SUBSTRING_RANGES
            .iter()
            .any(|&(lo, hi)| cp >= lo && cp <= hi)
    })
}

enum MatchKind {
    Substring(String),
    WholeWord(Regex),
}

/// A compiled view of the actor vocabulary ready for matching against
/// normalized text.
pub struct ActorMatcher {
    patterns: Vec<(String, MatchKind)>,
}

impl ActorMatcher {
    /// Build a matcher from loaded actor records. Aliases that fail to
    /// compile into a regex (should not happen for escaped literals) are
    /// skipped rather than failing the whole build.
    pub fn build(records: &[ActorRecord]) -> Self {
        let mut patterns = Vec::new();
        for record in records {
            for alias in &record.aliases {
                let normalized = normalize(alias);
                if normalized.is_empty() {
                    continue;
                }
                let kind = if has_substring_script_chars(&normalized) {
                    MatchKind::Substring(normalized)
                } else {
                    let pattern = format!(r"\b{}\b", regex::escape(&normalized));
                    match Regex::new(&pattern) {
                        Ok(re) => MatchKind::WholeWord(re),
                        Err(_) => continue,
                    }
                };
                patterns.push((record.code.clone(), kind));
            }
        }
        Self { patterns }
    }

    /// Return the first entity code whose alias matches `text`, in
    /// vocabulary load order. `text` is normalized internally.
    pub fn first_hit(&self, text: &str) -> Option<String> {
        let normalized = normalize(text);
        self.patterns
            .iter()
            .find(|(_, kind)| matches(kind, &normalized))
            .map(|(code, _)| code.clone())
    }

    /// Return every distinct entity code whose alias matches `text`,
    /// deduplicated but otherwise in vocabulary load order. If `seed` names
    /// an entity already known to match (e.g. from a prior gate decision)
    /// it is included first even if, for whatever reason, it fails to
    /// independently re-match — callers use this defensively, the bucket
    /// stage always recomputes from scratch.
    pub fn all_hits(&self, text: &str, seed: Option<&str>) -> Vec<String> {
        let normalized = normalize(text);
        let mut hits = Vec::new();
        if let Some(seed) = seed {
            hits.push(seed.to_string());
        }
        for (code, kind) in &self.patterns {
            if matches(kind, &normalized) && !hits.contains(code) {
                hits.push(code.clone());
            }
        }
        hits
    }
}

fn matches(kind: &MatchKind, normalized_text: &str) -> bool {
    match kind {
        MatchKind::Substring(needle) => normalized_text.contains(needle.as_str()),
        MatchKind::WholeWord(re) => re.is_match(normalized_text),
    }
}

/// NFKC-normalize, lowercase, and collapse whitespace runs to single spaces.
/// Applied to both vocabulary aliases and input text so the two sides of a
/// comparison always share a canonical form.
pub fn normalize(text: &str) -> String {
    let nfkc: String = text.nfkc().collect();
    let lowered = nfkc.to_lowercase();
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}
