//! Inline sign overrides and their reconciliation with arc weights.
//!
//! An inline `sign="-"` says the reported magnitude is negative. It sets the
//! sign of the value (`-|v|`) rather than flipping it, so a value that was
//! already mapped as negative is not negated twice. The arc weight is applied
//! afterwards by the calculation verifier.
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info, warn};

use super::instance::resolve_instance;
use crate::error::VerifyError;
use crate::store::normalize_concept;

const NON_FRACTION_TAG: &str = r#"(?i)<(?:ix|ixbrl|ix\d+):nonfraction\b([^>]*)>"#;
const SIGN_ATTR: &str = r#"(?i)\bsign\s*=\s*["']([+-])["']"#;
const NAME_ATTR: &str = r#"(?i)\bname\s*=\s*["']([^"']+)["']"#;
const CONTEXT_ATTR: &str = r#"(?i)\bcontextref\s*=\s*["']([^"']+)["']"#;

/// Result of applying an override to one value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignedValue {
    pub value: f64,
    /// An override exists for this (concept, context).
    pub corrected: bool,
}

/// Read-only set of `(concept, context)` pairs declared negative inline.
#[derive(Debug, Clone, Default)]
pub struct SignHandler {
    exact: HashSet<(String, String)>,
    normalized: HashSet<(String, String)>,
}

impl SignHandler {
    /// No overrides; every value is taken as reported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads overrides from a file, or from the instance found in a directory.
    pub fn load(location: &Path) -> Result<Self, VerifyError> {
        let Some(path) = resolve_instance(location) else {
            debug!(path = %location.display(), "No instance document, sign overrides disabled");
            return Ok(Self::empty());
        };
        let bytes = std::fs::read(&path).map_err(|e| VerifyError::io(&path, e))?;
        let handler = Self::from_document(&String::from_utf8_lossy(&bytes));
        info!(path = %path.display(), overrides = handler.len(), "Loaded inline sign overrides");
        Ok(handler)
    }

    /// Parses every inline `nonFraction` element carrying `sign="-"`.
    /// Documents that are not inline XBRL yield no overrides.
    pub fn from_document(content: &str) -> Self {
        let mut handler = Self::empty();
        let lowered = content.to_ascii_lowercase();
        if !lowered.contains("<ix:") && !lowered.contains("xmlns:ix=") {
            return handler;
        }

        let (tag, sign, name, context) = match (
            Regex::new(NON_FRACTION_TAG),
            Regex::new(SIGN_ATTR),
            Regex::new(NAME_ATTR),
            Regex::new(CONTEXT_ATTR),
        ) {
            (Ok(t), Ok(s), Ok(n), Ok(c)) => (t, s, n, c),
            _ => {
                warn!("Sign override patterns failed to compile");
                return handler;
            }
        };

        for caps in tag.captures_iter(content) {
            let Some(attrs) = caps.get(1).map(|m| m.as_str()) else { continue };
            let negative = sign.captures(attrs).and_then(|c| c.get(1)).is_some_and(|m| m.as_str() == "-");
            if !negative {
                continue;
            }
            let concept = name.captures(attrs).and_then(|c| c.get(1)).map(|m| m.as_str());
            let context_id = context.captures(attrs).and_then(|c| c.get(1)).map(|m| m.as_str());
            if let (Some(concept), Some(context_id)) = (concept, context_id) {
                handler.insert(concept, context_id);
            }
        }
        handler
    }

    pub fn insert(&mut self, concept: &str, context_id: &str) {
        self.exact.insert((concept.to_string(), context_id.to_string()));
        self.normalized.insert((normalize_concept(concept), context_id.to_string()));
    }

    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Exact name, then `prefix_Local` as `prefix:Local`, then normalized local name.
    pub fn is_negated(&self, concept: &str, context_id: &str) -> bool {
        if self.exact.is_empty() {
            return false;
        }
        let ctx = context_id.to_string();
        if self.exact.contains(&(concept.to_string(), ctx.clone())) {
            return true;
        }
        if concept.contains('_') && self.exact.contains(&(concept.replacen('_', ":", 1), ctx.clone())) {
            return true;
        }
        self.normalized.contains(&(normalize_concept(concept), ctx))
    }

    pub fn apply(&self, value: f64, concept: &str, context_id: &str) -> SignedValue {
        if self.is_negated(concept, context_id) {
            SignedValue { value: -value.abs(), corrected: true }
        } else {
            SignedValue { value, corrected: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DOC: &str = r#"<html xmlns:ix="http://www.xbrl.org/2013/inlineXBRL">
        <ix:nonFraction name="us-gaap:IncomeTaxExpenseBenefit" contextRef="FY2024" unitRef="usd" sign="-" decimals="-3">1,200</ix:nonFraction>
        <ix:nonFraction contextRef='FY2024' sign='-' name='us-gaap:OtherNonoperatingIncomeExpense'>50</ix:nonFraction>
        <ix:nonFraction name="us-gaap:Revenues" contextRef="FY2024" sign="+">900</ix:nonFraction>
        <ix:nonFraction name="us-gaap:CostOfRevenue" contextRef="FY2024">400</ix:nonFraction>
    </html>"#;

    #[test]
    fn test_parses_negative_overrides_in_any_attribute_order() {
        let handler = SignHandler::from_document(DOC);
        assert_eq!(handler.len(), 2);
        assert!(handler.is_negated("us-gaap:IncomeTaxExpenseBenefit", "FY2024"));
        assert!(handler.is_negated("us-gaap:OtherNonoperatingIncomeExpense", "FY2024"));
        assert!(!handler.is_negated("us-gaap:Revenues", "FY2024"));
        assert!(!handler.is_negated("us-gaap:IncomeTaxExpenseBenefit", "FY2023"));
    }

    #[test]
    fn test_lookup_tolerates_underscore_and_bare_names() {
        let handler = SignHandler::from_document(DOC);
        assert!(handler.is_negated("us-gaap_IncomeTaxExpenseBenefit", "FY2024"));
        assert!(handler.is_negated("IncomeTaxExpenseBenefit", "FY2024"));
    }

    #[test]
    fn test_apply_does_not_double_negate() {
        let handler = SignHandler::from_document(DOC);
        let concept = "us-gaap:IncomeTaxExpenseBenefit";
        assert_eq!(handler.apply(1200.0, concept, "FY2024").value, -1200.0);
        assert_eq!(handler.apply(-1200.0, concept, "FY2024").value, -1200.0);
        let untouched = handler.apply(900.0, "us-gaap:Revenues", "FY2024");
        assert_eq!(untouched, SignedValue { value: 900.0, corrected: false });
    }

    #[test]
    fn test_plain_xbrl_has_no_overrides() {
        let doc = r#"<xbrli:xbrl><us-gaap:Assets contextRef="c1" sign="-">5</us-gaap:Assets></xbrli:xbrl>"#;
        assert!(SignHandler::from_document(doc).is_empty());
    }

    #[test]
    fn test_load_from_directory_and_missing_location() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("filing.htm")).unwrap();
        file.write_all(DOC.as_bytes()).unwrap();

        let handler = SignHandler::load(dir.path()).unwrap();
        assert_eq!(handler.len(), 2);

        let missing = SignHandler::load(&dir.path().join("absent")).unwrap();
        assert!(missing.is_empty());
    }
}
