//! Loads actor aliases from a CSV vocabulary source.
//!
//! Grounded on `original_source/apps/clust1/vocab_loader.py`'s
//! `load_actor_aliases` / `validate_vocabularies`, reexpressed with typed
//! records instead of a loose `Dict[str, List[str]]`.

use std::collections::HashSet;
use std::path::Path;

use crate::error::PipelineError;

const ALIAS_COLUMNS: [&str; 5] = [
    "aliases_en",
    "aliases_es",
    "aliases_fr",
    "aliases_ru",
    "aliases_zh",
];

/// Bare short tokens that are usable as aliases despite looking like
/// ambiguous acronyms (the usability allow-list from the spec).
const ALLOW_LIST: &[&str] = &[
    "us", "usa", "uk", "uae", "un", "eu", "nato", "who", "imf", "g7", "g20", "brics", "asean",
];

/// Aliases that are dropped outright because they collide with common
/// English words or other entities, regardless of length.
const DENY_LIST: &[&str] = &["china", "america", "states"];

/// A single entity's canonical code and flattened, deduplicated alias list.
/// The primary English name (the first entry of `aliases_en`) is always
/// first, per the spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorRecord {
    pub code: String,
    pub aliases: Vec<String>,
}

/// Validation summary, mirroring `validate_vocabularies()` in the original.
#[derive(Debug, Clone, Default)]
pub struct VocabularyReport {
    pub entity_count: usize,
    pub total_aliases: usize,
    pub warnings: Vec<String>,
}

/// Load and flatten actor aliases from a CSV file at `path`.
///
/// Columns: `entity_id, aliases_en, aliases_es, aliases_fr, aliases_ru,
/// aliases_zh`, each alias column semicolon-separated. Fails if the file
/// is missing, empty, or yields zero usable entities.
pub fn load_actor_aliases(path: &Path) -> Result<Vec<ActorRecord>, PipelineError> {
    let mut reader = csv::Reader::from_path(path)
        .map_err(|e| PipelineError::VocabularyLoad(format!("{}: {e}", path.display())))?;

    let headers = reader.headers()?.clone();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let mut get = |col: &str| -> Option<String> {
            headers
                .iter()
                .position(|h| h == col)
                .and_then(|i| row.get(i))
                .map(|s| s.to_string())
        };

        let Some(entity_id) = get("entity_id").filter(|s| !s.trim().is_empty()) else {
            continue;
        };

        let mut bag: Vec<String> = Vec::new();
        for col in ALIAS_COLUMNS {
            if let Some(raw) = get(col) {
                for alias in raw.split(';') {
                    let alias = alias.trim();
                    if !alias.is_empty() {
                        bag.push(alias.to_string());
                    }
                }
            }
        }

        let aliases = dedup_preserving_order(bag);
        let aliases: Vec<String> = aliases.into_iter().filter(|a| is_usable_alias(a)).collect();

        if !aliases.is_empty() {
            records.push(ActorRecord {
                code: entity_id,
                aliases,
            });
        }
    }

    if records.is_empty() {
        return Err(PipelineError::VocabularyLoad(format!(
            "{}: no usable actor records found",
            path.display()
        )));
    }

    Ok(records)
}

/// Dedupe aliases case-insensitively, keeping first-seen order and casing.
fn dedup_preserving_order(aliases: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(aliases.len());
    for alias in aliases {
        let key = alias.to_lowercase();
        if seen.insert(key) {
            out.push(alias);
        }
    }
    out
}

/// Applies the usability filter: explicit allow-list always kept, deny-list
/// always dropped, and otherwise bare 2-3 letter uppercase tokens or bare
/// 2-letter lowercase tokens are dropped as inherently ambiguous.
fn is_usable_alias(alias: &str) -> bool {
    let lower = alias.to_lowercase();

    if ALLOW_LIST.contains(&lower.as_str()) {
        return true;
    }
    if DENY_LIST.contains(&lower.as_str()) {
        return false;
    }
    if alias.contains(char::is_whitespace) {
        return true;
    }

    let len = alias.chars().count();
    let is_all_upper = alias.chars().all(|c| !c.is_alphabetic() || c.is_uppercase());
    let is_all_lower = alias.chars().all(|c| !c.is_alphabetic() || c.is_lowercase());

    if (2..=3).contains(&len) && is_all_upper {
        return false;
    }
    if len == 2 && is_all_lower {
        return false;
    }

    true
}

/// Load the vocabulary and report basic health stats without failing on
/// non-fatal issues (entities with no aliases after filtering, duplicate
/// entity ids).
pub fn validate_vocabulary(path: &Path) -> Result<VocabularyReport, PipelineError> {
    let records = load_actor_aliases(path)?;

    let mut seen_codes: HashSet<String> = HashSet::new();
    let mut warnings = Vec::new();
    let mut total_aliases = 0usize;

    for record in &records {
        if !seen_codes.insert(record.code.clone()) {
            warnings.push(format!("duplicate entity id: {}", record.code));
        }
        total_aliases += record.aliases.len();
    }

    Ok(VocabularyReport {
        entity_count: records.len(),
        total_aliases,
        warnings,
    })
}
