//! Mapped statements as delivered by the extraction stage, and their
//! conversion into [`Fact`]s.
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::types::{Decimals, Fact, Unit};
use super::values::{normalize_concept, parse_value_text, ParsedValue};

/// A reported value before parsing: either already numeric or display text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementFact {
    pub concept: String,
    #[serde(default)]
    pub value: Option<RawValue>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub decimals: Option<Decimals>,
    #[serde(default)]
    pub context_id: Option<String>,
    #[serde(default)]
    pub is_abstract: bool,
    #[serde(default)]
    pub is_nil: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub facts: Vec<StatementFact>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MappedStatements {
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// Counters describing what the extraction kept and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ExtractionStats {
    pub total: usize,
    pub kept: usize,
    pub abstract_skipped: usize,
    pub missing_context: usize,
    pub nil_skipped: usize,
    pub unparseable: usize,
}

impl MappedStatements {
    /// Flattens every statement line item into facts, in statement order.
    pub fn to_facts(&self, include_nil: bool) -> (Vec<Fact>, ExtractionStats) {
        let mut facts = Vec::new();
        let mut stats = ExtractionStats::default();

        for statement in &self.statements {
            for item in &statement.facts {
                stats.total += 1;

                if item.is_abstract {
                    stats.abstract_skipped += 1;
                    continue;
                }

                let context_id = match item.context_id.as_deref().map(str::trim) {
                    Some(id) if !id.is_empty() => id.to_string(),
                    _ => {
                        stats.missing_context += 1;
                        continue;
                    }
                };

                let parsed = match (&item.value, item.is_nil) {
                    (_, true) | (None, _) => ParsedValue::Nil,
                    (Some(RawValue::Number(v)), _) if v.is_finite() => ParsedValue::Number(*v),
                    (Some(RawValue::Number(_)), _) => ParsedValue::Invalid,
                    (Some(RawValue::Text(text)), _) => parse_value_text(text),
                };

                let (value, is_nil) = match parsed {
                    ParsedValue::Number(v) => (v, false),
                    ParsedValue::Nil if include_nil => (0.0, true),
                    ParsedValue::Nil => {
                        stats.nil_skipped += 1;
                        continue;
                    }
                    ParsedValue::Invalid => {
                        stats.unparseable += 1;
                        continue;
                    }
                };

                facts.push(Fact {
                    concept: normalize_concept(&item.concept),
                    original_concept: item.concept.clone(),
                    value,
                    unit: item.unit.as_ref().filter(|u| !u.trim().is_empty()).map(Unit::new),
                    decimals: item.decimals.unwrap_or_default(),
                    context_id,
                    is_nil,
                    statement: Some(statement.name.clone()),
                });
                stats.kept += 1;
            }
        }

        debug!(
            total = stats.total,
            kept = stats.kept,
            nil_skipped = stats.nil_skipped,
            unparseable = stats.unparseable,
            "Extracted facts from mapped statements"
        );
        (facts, stats)
    }
}
