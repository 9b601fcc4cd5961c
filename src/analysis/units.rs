//! Canonical parsing of unit measures for U-Equal comparison.
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Registry prefixes that may be joined to a measure with `_` instead of `:`.
const MEASURE_PREFIXES: &[&str] = &["iso4217", "xbrli", "utr", "unit"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnitError {
    #[error("Empty unit measure")]
    Empty,
    #[error("Unit measure '{0}' has more than one division")]
    ExtraDivision(String),
    #[error("Unit factor '{0}' has no base measure")]
    MissingBase(String),
    #[error("Unit factor '{0}' has an invalid exponent")]
    BadExponent(String),
}

/// A parsed unit, mapping each base measure to its exponent.
/// Example: "iso4217:USD / xbrli:shares" -> { "usd": 1, "shares": -1 }
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParsedUnit {
    terms: BTreeMap<String, i32>,
}

impl ParsedUnit {
    /// Parses a measure expression built from `*`, `/` and `^`.
    pub fn from_measure(s: &str) -> Result<Self, UnitError> {
        if s.trim().is_empty() {
            return Err(UnitError::Empty);
        }

        let mut terms = BTreeMap::new();
        let mut parts = s.split('/');

        if let Some(num) = parts.next() {
            Self::parse_product(num, 1, &mut terms)?;
        }
        if let Some(den) = parts.next() {
            Self::parse_product(den, -1, &mut terms)?;
        }
        if parts.next().is_some() {
            return Err(UnitError::ExtraDivision(s.to_string()));
        }

        terms.retain(|_, exp| *exp != 0);
        Ok(Self { terms })
    }

    fn parse_product(s: &str, sign: i32, terms: &mut BTreeMap<String, i32>) -> Result<(), UnitError> {
        let s = s.trim();
        if s.is_empty() || s == "1" {
            return Ok(());
        }
        for factor in s.split('*') {
            let mut parts = factor.split('^');
            let base = strip_measure_prefix(parts.next().unwrap_or_default().trim());
            if base.is_empty() {
                return Err(UnitError::MissingBase(factor.to_string()));
            }
            let exp = parts
                .next()
                .map_or(Ok(1), |e| e.trim().parse::<i32>())
                .map_err(|_| UnitError::BadExponent(factor.to_string()))?;
            *terms.entry(base.to_ascii_lowercase()).or_insert(0) += exp * sign;
        }
        Ok(())
    }
}

fn strip_measure_prefix(base: &str) -> &str {
    if let Some((_, local)) = base.rsplit_once(':') {
        return local;
    }
    if let Some((prefix, local)) = base.split_once('_') {
        if MEASURE_PREFIXES.iter().any(|p| prefix.eq_ignore_ascii_case(p)) {
            return local;
        }
    }
    base
}

impl fmt::Display for ParsedUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let render = |positive: bool| -> String {
            let picked: Vec<String> = self
                .terms
                .iter()
                .filter(|&(_, &v)| (v > 0) == positive)
                .map(|(k, v)| if v.abs() == 1 { k.clone() } else { format!("{}^{}", k, v.abs()) })
                .collect();
            if picked.is_empty() { "1".to_string() } else { picked.join("*") }
        };

        let num = render(true);
        let den = render(false);
        if den == "1" {
            f.write_str(&num)
        } else {
            write!(f, "{}/{}", num, den)
        }
    }
}
