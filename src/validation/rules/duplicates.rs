//! Rules reporting duplicate facts before any calculation runs.
use crate::facts::{FactGroups, FlaggedDuplicate};
use crate::validation::result::{CheckDetails, CheckKind, CheckResult, DuplicateDetails, DuplicateItem, Severity};

fn details(flagged: &[FlaggedDuplicate], cap: usize) -> CheckDetails {
    CheckDetails::Duplicates(DuplicateDetails {
        count: flagged.len(),
        items: flagged
            .iter()
            .take(cap)
            .map(|d| DuplicateItem {
                context_id: d.context_id.clone(),
                concept: d.concept.clone(),
                original_concept: d.original_concept.clone(),
                values: d.values.clone(),
                decimals: d.decimals.clone(),
            })
            .collect(),
    })
}

/// Critical when any (context, concept) holds values that disagree.
pub(crate) fn validate_inconsistent_duplicates(groups: &FactGroups, cap: usize) -> Option<CheckResult> {
    let flagged = groups.find_inconsistent_duplicates();
    if flagged.is_empty() {
        return None;
    }

    let mut concepts: Vec<&str> = flagged.iter().map(|d| d.original_concept.as_str()).collect();
    concepts.sort_unstable();
    concepts.dedup();
    let shown = concepts.iter().take(5).copied().collect::<Vec<_>>().join(", ");

    Some(
        CheckResult::fail(
            CheckKind::DuplicateFacts,
            Severity::Critical,
            format!("{} inconsistent duplicate fact sets ({})", flagged.len(), shown),
        )
        .with_details(details(&flagged, cap)),
    )
}

/// Warning when duplicates were only accepted through the percentage fallback.
pub(crate) fn validate_percentage_reliance(groups: &FactGroups, cap: usize) -> Option<CheckResult> {
    let flagged = groups.find_percentage_reliant_duplicates();
    if flagged.is_empty() {
        return None;
    }
    Some(
        CheckResult::fail(
            CheckKind::DuplicateFacts,
            Severity::Warning,
            format!("{} duplicate fact sets agree only within the percentage tolerance", flagged.len()),
        )
        .with_details(details(&flagged, cap)),
    )
}
