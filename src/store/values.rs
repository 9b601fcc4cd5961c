//! Raw value parsing and concept-name normalization.

/// Strings that mark a reported value as nil.
const NIL_MARKERS: &[&str] = &["", "-", "--", "---", "\u{2014}", "\u{2013}", "nil", "n/a", "none"];

/// Namespace prefixes that are stripped when joined to a local name by `_`.
const KNOWN_TAXONOMY_PREFIXES: &[&str] = &[
    "us-gaap", "usgaap", "ifrs-full", "ifrs", "dei", "srt", "country", "currency", "exch",
    "naics", "sic", "stpr", "invest", "ecd", "custom",
];

const MAX_EXTENSION_PREFIX_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParsedValue {
    Number(f64),
    Nil,
    Invalid,
}

/// Parses a displayed value such as `"1,234"`, `"$ (500)"` or `"—"`.
pub fn parse_value_text(raw: &str) -> ParsedValue {
    let trimmed = raw.trim();
    if NIL_MARKERS.iter().any(|m| trimmed.eq_ignore_ascii_case(m)) {
        return ParsedValue::Nil;
    }

    let negative = trimmed.contains('(');
    let cleaned: String = trimmed
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '(' | ')') && !c.is_whitespace())
        .collect();

    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => ParsedValue::Number(if negative { -v.abs() } else { v }),
        _ => ParsedValue::Invalid,
    }
}

/// Extracts the local part of a concept name.
///
/// Handles Clark notation (`{ns}Assets`), colon prefixes (`us-gaap:Assets`),
/// and underscore prefixes (`us-gaap_Assets`, `aapl_NetSales`).
pub fn local_name(concept: &str) -> &str {
    let concept = concept.trim();

    if let Some(rest) = concept.strip_prefix('{') {
        if let Some(end) = rest.rfind('}') {
            return &rest[end + 1..];
        }
    }

    if concept.contains(':') && !concept.contains("://") {
        return concept.rsplit(':').next().unwrap_or(concept);
    }

    if let Some((prefix, rest)) = concept.split_once('_') {
        let lowered = prefix.to_ascii_lowercase();
        if KNOWN_TAXONOMY_PREFIXES.contains(&lowered.as_str()) || is_extension_prefix(prefix, rest) {
            return rest;
        }
    }

    concept
}

fn is_extension_prefix(prefix: &str, rest: &str) -> bool {
    !prefix.is_empty()
        && prefix.len() <= MAX_EXTENSION_PREFIX_LEN
        && prefix.chars().all(|c| c.is_ascii_alphabetic())
        && rest.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Lowercases and removes `_`, `-` and spaces.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Canonical key for a concept: local name, then [`normalize_name`].
pub fn normalize_concept(concept: &str) -> String {
    normalize_name(local_name(concept))
}
