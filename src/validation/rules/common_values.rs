//! Rule for values shared across statements.
use crate::analysis::tolerance::values_equal;
use crate::validation::result::{CheckDetails, CheckKind, CheckResult, CommonValueDetails, Severity, StatementValue};

/// One concept in one context as reported by several statements.
pub(crate) struct SharedValue<'a> {
    pub concept: &'a str,
    pub original_concept: &'a str,
    pub context_id: &'a str,
    pub period_key: String,
    pub values: Vec<StatementValue>,
}

/// Returns a warning when the statements disagree beyond precision.
pub(crate) fn validate_shared_value(shared: &SharedValue<'_>) -> Option<CheckResult> {
    let values = &shared.values;
    let consistent = values.iter().enumerate().all(|(i, a)| {
        values[i + 1..].iter().all(|b| values_equal(a.value, b.value, a.decimals, b.decimals))
    });
    if consistent {
        return None;
    }

    let listing = values
        .iter()
        .map(|v| format!("{}={}", v.statement, v.value))
        .collect::<Vec<_>>()
        .join(", ");

    Some(
        CheckResult::fail(
            CheckKind::CommonValuesConsistency,
            Severity::Warning,
            format!("{} differs across statements in {}: {}", shared.original_concept, shared.context_id, listing),
        )
        .with_details(CheckDetails::CommonValues(CommonValueDetails {
            concept: shared.concept.to_string(),
            context_id: shared.context_id.to_string(),
            period_key: shared.period_key.clone(),
            values: values.clone(),
        })),
    )
}
