//! Cross-statement consistency of values reported more than once.
use std::collections::HashMap;
use tracing::info;

use super::result::{CheckDetails, CheckKind, CheckResult, StatementValue};
use super::rules::common_values::{validate_shared_value, SharedValue};
use crate::analysis::{is_dimensional, ContextMatcher};
use crate::store::Fact;

pub struct VerticalChecker {
    matcher: ContextMatcher,
}

impl Default for VerticalChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl VerticalChecker {
    pub fn new() -> Self {
        Self { matcher: ContextMatcher::new() }
    }

    /// Compares every non-dimensional (concept, context) that appears in
    /// more than one statement. Emits one warning per disagreement, or a
    /// single passing summary.
    pub fn check_all(&self, facts: &[Fact]) -> Vec<CheckResult> {
        if facts.is_empty() {
            return Vec::new();
        }

        // (concept, context) -> facts, first-seen order
        let mut order: Vec<(&str, &str)> = Vec::new();
        let mut buckets: HashMap<(&str, &str), Vec<&Fact>> = HashMap::new();
        for fact in facts.iter().filter(|f| f.statement.is_some() && !is_dimensional(&f.context_id)) {
            let key = (fact.concept.as_str(), fact.context_id.as_str());
            let bucket = buckets.entry(key).or_default();
            if bucket.is_empty() {
                order.push(key);
            }
            bucket.push(fact);
        }

        let mut results = Vec::new();
        let mut compared = 0;
        for key in order {
            let bucket = &buckets[&key];
            let mut values: Vec<StatementValue> = Vec::new();
            for fact in bucket {
                let statement = fact.statement.clone().unwrap_or_default();
                if values.iter().any(|v| v.statement == statement) {
                    continue;
                }
                values.push(StatementValue { statement, value: fact.value, decimals: fact.decimals });
            }
            if values.len() < 2 {
                continue;
            }
            compared += 1;

            let period = self.matcher.period(key.1);
            let shared = SharedValue {
                concept: key.0,
                original_concept: &bucket[0].original_concept,
                context_id: key.1,
                period_key: if period.period_key.is_empty() { format!("ctx:{}", key.1) } else { period.period_key },
                values,
            };
            if let Some(result) = validate_shared_value(&shared) {
                results.push(result);
            }
        }

        info!(compared, inconsistent = results.len(), "Vertical verification complete");
        if results.is_empty() {
            results.push(
                CheckResult::pass(
                    CheckKind::CommonValuesConsistency,
                    format!("{} values shared across statements are consistent", compared),
                )
                .with_details(CheckDetails::Summary { evaluated: compared }),
            );
        }
        results
    }
}
