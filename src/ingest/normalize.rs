//! Title normalization, publisher extraction, content hashing, and language
//! detection — the per-entry extraction pipeline.
//!
//! Grounded on `original_source/apps/ingest/rss_fetcher.py`'s
//! `normalize_title` / `extract_real_publisher` / `generate_content_hash` /
//! `detect_language`.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;
use url::Url;

/// Characters kept in `title_norm` besides word characters and whitespace.
static NOISE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s\-,.!?:;]").expect("static regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("static regex"));

const SUFFIX_DASHES: [&str; 3] = [" – ", " — ", " - "];

/// Both forms of a title derived from the raw feed entry text: the
/// NFKC-normalized display form with a trailing `"<dash> <publisher>"`
/// suffix stripped, and the lowercased, symbol-stripped form used for
/// matching.
pub struct NormalizedTitle {
    pub title_display: String,
    pub title_norm: String,
}

/// Normalize a raw entry title. `publisher_name`, when known, is used to
/// strip an exact, case-sensitive `" – <publisher>"` / `" — <publisher>"` /
/// `" - <publisher>"` suffix that Google News and similar aggregators
/// append.
pub fn normalize_title(raw_title: &str, publisher_name: Option<&str>) -> NormalizedTitle {
    let nfkc: String = raw_title.nfkc().collect();
    let collapsed = collapse_whitespace(&nfkc);

    let stripped = match publisher_name {
        Some(publisher) if !publisher.is_empty() => strip_publisher_suffix(&collapsed, publisher),
        _ => collapsed,
    };
    let title_display = collapse_whitespace(&stripped);

    let lowered = title_display.to_lowercase();
    let dash_folded = fold_dashes(&lowered);
    let stripped_symbols = NOISE_CHARS.replace_all(&dash_folded, "");
    let title_norm = collapse_whitespace(&stripped_symbols);

    NormalizedTitle {
        title_display,
        title_norm,
    }
}

/// Fold en-dash (U+2013) and em-dash (U+2014) to an ASCII hyphen before the
/// noise strip. NFKC does not compatibility-decompose either to `-`, so
/// without this they fall outside `NOISE_CHARS`'s kept set and are dropped
/// instead of becoming the hyphen `title_norm` is meant to retain.
fn fold_dashes(text: &str) -> String {
    text.replace(['\u{2013}', '\u{2014}'], "-")
}

fn strip_publisher_suffix(title: &str, publisher: &str) -> String {
    for dash in SUFFIX_DASHES {
        let suffix = format!("{dash}{publisher}");
        if let Some(stripped) = title.strip_suffix(&suffix) {
            return stripped.to_string();
        }
    }
    title.to_string()
}

fn collapse_whitespace(text: &str) -> String {
    WHITESPACE.replace_all(text.trim(), " ").to_string()
}

/// Real publisher name and lowercased domain (leading `www.` stripped),
/// preferring the entry's `<source>` sub-element (as Google News emits)
/// over the feed channel's own title.
pub fn extract_publisher(
    source_text: Option<&str>,
    entry_link: Option<&str>,
    feed_title: Option<&str>,
) -> (Option<String>, Option<String>) {
    if let Some(name) = source_text.filter(|s| !s.trim().is_empty()) {
        let domain = entry_link.and_then(extract_domain);
        return (Some(name.trim().to_string()), domain);
    }

    let name = feed_title.filter(|s| !s.trim().is_empty()).map(|s| s.trim().to_string());
    let domain = entry_link.and_then(extract_domain);
    (name, domain)
}

fn extract_domain(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_lowercase())
}

/// First 16 hex characters of SHA-256 over `"{title_norm}||{domain}"`.
pub fn content_hash(title_norm: &str, publisher_domain: Option<&str>) -> String {
    let domain = publisher_domain.unwrap_or("");
    let input = format!("{title_norm}||{domain}");
    let digest = Sha256::digest(input.as_bytes());
    let hex = hex_encode(&digest);
    hex[..16].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    use std::fmt::Write;
    let mut out = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(out, "{byte:02x}").expect("writing to String never fails");
    }
    out
}

/// Detected language code and confidence in `[0, 1]`. Returns `(None, 0.0)`
/// for inputs shorter than 3 characters or when detection is inconclusive.
pub fn detect_language(title_display: &str) -> (Option<String>, f64) {
    if title_display.chars().count() < 3 {
        return (None, 0.0);
    }

    match whatlang::detect(title_display) {
        Some(info) => (Some(info.lang().code().to_string()), info.confidence()),
        None => (None, 0.0),
    }
}
