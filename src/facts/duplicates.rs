//! Classification of repeated facts for one (context, concept) pair.
use serde::Serialize;
use smallvec::SmallVec;

use crate::analysis::tolerance::values_equal;
use crate::store::{Decimals, Fact, Unit};

/// One reported occurrence of a fact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FactEntry {
    pub value: f64,
    pub decimals: Decimals,
    pub unit: Option<Unit>,
    pub original_concept: String,
    pub statement: Option<String>,
}

impl From<&Fact> for FactEntry {
    fn from(fact: &Fact) -> Self {
        Self {
            value: fact.value,
            decimals: fact.decimals,
            unit: fact.unit.clone(),
            original_concept: fact.original_concept.clone(),
            statement: fact.statement.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateType {
    /// Reported once.
    Unique,
    /// Equal values with identical decimals.
    Complete,
    /// Equal values at differing precision.
    Consistent,
    /// Values disagree, no usable value.
    Inconsistent,
}

/// What made a duplicate set count as equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EqualityBasis {
    Decimal,
    PercentageFallback,
}

/// All entries sharing a (context, concept), plus their derived classification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateInfo {
    concept: String,
    entries: SmallVec<[FactEntry; 2]>,
    duplicate_type: DuplicateType,
    selected: Option<usize>,
    basis: Option<EqualityBasis>,
}

impl DuplicateInfo {
    pub fn new(fact: &Fact) -> Self {
        let mut entries = SmallVec::new();
        entries.push(FactEntry::from(fact));
        Self {
            concept: fact.concept.clone(),
            entries,
            duplicate_type: DuplicateType::Unique,
            selected: Some(0),
            basis: None,
        }
    }

    /// Appends an entry and reclassifies the whole set.
    pub fn push(&mut self, fact: &Fact, percentage_tolerance: f64) {
        self.entries.push(FactEntry::from(fact));
        let (duplicate_type, selected, basis) = classify(&self.entries, percentage_tolerance);
        self.duplicate_type = duplicate_type;
        self.selected = selected;
        self.basis = basis;
    }

    pub fn concept(&self) -> &str {
        &self.concept
    }

    /// Source name of the first entry.
    pub fn original_concept(&self) -> &str {
        &self.entries[0].original_concept
    }

    pub fn entries(&self) -> &[FactEntry] {
        &self.entries
    }

    pub fn duplicate_type(&self) -> DuplicateType {
        self.duplicate_type
    }

    pub fn basis(&self) -> Option<EqualityBasis> {
        self.basis
    }

    pub fn is_duplicate(&self) -> bool {
        self.entries.len() > 1
    }

    pub fn is_inconsistent(&self) -> bool {
        self.duplicate_type == DuplicateType::Inconsistent
    }

    pub fn selected(&self) -> Option<&FactEntry> {
        self.selected.map(|i| &self.entries[i])
    }

    /// The usable value, absent for inconsistent sets.
    pub fn selected_value(&self) -> Option<f64> {
        self.selected().map(|e| e.value)
    }

    pub fn selected_decimals(&self) -> Option<Decimals> {
        self.selected().map(|e| e.decimals)
    }

    /// Unit of the first entry.
    pub fn unit(&self) -> Option<&Unit> {
        self.entries[0].unit.as_ref()
    }
}

/// Classifies a set of entries. Equality is checked over every pair, so the
/// outcome does not depend on entry order.
pub fn classify(
    entries: &[FactEntry],
    percentage_tolerance: f64,
) -> (DuplicateType, Option<usize>, Option<EqualityBasis>) {
    match entries.len() {
        0 => return (DuplicateType::Inconsistent, None, None),
        1 => return (DuplicateType::Unique, Some(0), None),
        _ => {}
    }

    let basis = if all_decimal_equal(entries) {
        EqualityBasis::Decimal
    } else if within_percentage(entries, percentage_tolerance) {
        EqualityBasis::PercentageFallback
    } else {
        return (DuplicateType::Inconsistent, None, None);
    };

    let first = entries[0].decimals;
    let duplicate_type = if entries.iter().all(|e| e.decimals == first) {
        DuplicateType::Complete
    } else {
        DuplicateType::Consistent
    };

    (duplicate_type, Some(most_precise(entries)), Some(basis))
}

fn all_decimal_equal(entries: &[FactEntry]) -> bool {
    entries.iter().enumerate().all(|(i, a)| {
        entries[i + 1..]
            .iter()
            .all(|b| values_equal(a.value, b.value, a.decimals, b.decimals))
    })
}

/// Spread of the values relative to the largest magnitude.
fn within_percentage(entries: &[FactEntry], tolerance: f64) -> bool {
    let max_abs = entries.iter().map(|e| e.value.abs()).fold(0.0, f64::max);
    if max_abs == 0.0 {
        return true;
    }
    let max = entries.iter().map(|e| e.value).fold(f64::NEG_INFINITY, f64::max);
    let min = entries.iter().map(|e| e.value).fold(f64::INFINITY, f64::min);
    (max - min) / max_abs <= tolerance
}

/// Highest decimals wins. Ties go to the smallest magnitude, then the
/// smallest value, so the choice does not depend on entry order.
fn most_precise(entries: &[FactEntry]) -> usize {
    entries
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            b.decimals
                .cmp(&a.decimals)
                .then_with(|| a.value.abs().total_cmp(&b.value.abs()))
                .then_with(|| a.value.total_cmp(&b.value))
        })
        .map_or(0, |(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const PCT: f64 = 0.02;

    fn fact(value: f64, decimals: Decimals) -> Fact {
        Fact::new("us-gaap:Assets", value, "c1").with_decimals(decimals)
    }

    fn info(facts: &[Fact]) -> DuplicateInfo {
        let mut info = DuplicateInfo::new(&facts[0]);
        for f in &facts[1..] {
            info.push(f, PCT);
        }
        info
    }

    #[test]
    fn test_single_entry_is_unique() {
        let info = info(&[fact(5.0, Decimals::Finite(0))]);
        assert_eq!(info.duplicate_type(), DuplicateType::Unique);
        assert_eq!(info.selected_value(), Some(5.0));
        assert!(!info.is_duplicate());
    }

    #[test]
    fn test_consistent_selects_most_precise() {
        let info = info(&[fact(1000.0, Decimals::Finite(-3)), fact(1000.4, Decimals::Finite(0))]);
        assert_eq!(info.duplicate_type(), DuplicateType::Consistent);
        assert_eq!(info.selected_value(), Some(1000.4));
        assert_eq!(info.selected_decimals(), Some(Decimals::Finite(0)));
        assert_eq!(info.basis(), Some(EqualityBasis::Decimal));
    }

    #[rstest]
    #[case(&[1000.0, 1000.4])]
    #[case(&[1000.4, 1000.0])]
    fn test_equal_precision_tie_ignores_order(#[case] values: &[f64]) {
        let facts: Vec<Fact> = values.iter().map(|&v| fact(v, Decimals::Finite(-3))).collect();
        let info = info(&facts);
        assert_eq!(info.duplicate_type(), DuplicateType::Complete);
        assert_eq!(info.selected_value(), Some(1000.0));
    }

    #[test]
    fn test_identical_precision_is_complete() {
        let info = info(&[fact(250.0, Decimals::Finite(0)), fact(250.0, Decimals::Finite(0))]);
        assert_eq!(info.duplicate_type(), DuplicateType::Complete);
        assert_eq!(info.selected_value(), Some(250.0));
    }

    #[test]
    fn test_disagreeing_values_are_inconsistent() {
        let info = info(&[fact(1000.0, Decimals::Finite(-3)), fact(1500.0, Decimals::Finite(0))]);
        assert_eq!(info.duplicate_type(), DuplicateType::Inconsistent);
        assert_eq!(info.selected_value(), None);
        assert_eq!(info.selected_decimals(), None);
    }

    #[test]
    fn test_percentage_fallback_is_flagged() {
        // Differ at decimals 0 but sit within 2% of each other.
        let info = info(&[fact(10_000.0, Decimals::Finite(0)), fact(10_150.0, Decimals::Finite(0))]);
        assert_eq!(info.duplicate_type(), DuplicateType::Complete);
        assert_eq!(info.basis(), Some(EqualityBasis::PercentageFallback));
        assert_eq!(info.selected_value(), Some(10_000.0));
    }

    #[test]
    fn test_opposite_signs_are_not_percentage_equal() {
        let info = info(&[fact(500.0, Decimals::Finite(0)), fact(-500.0, Decimals::Finite(0))]);
        assert!(info.is_inconsistent());
    }

    #[test]
    fn test_all_zero_values_are_equal() {
        let info = info(&[fact(0.0, Decimals::Finite(0)), fact(0.0, Decimals::Finite(2))]);
        assert_eq!(info.duplicate_type(), DuplicateType::Consistent);
        assert_eq!(info.selected_decimals(), Some(Decimals::Finite(2)));
    }

    #[test]
    fn test_pairwise_check_catches_non_adjacent_disagreement() {
        // Each value agrees with the first at -3, but the last two disagree at 0.
        let info = info(&[
            fact(1000.0, Decimals::Finite(-3)),
            fact(1100.0, Decimals::Finite(0)),
            fact(1400.0, Decimals::Finite(0)),
        ]);
        assert!(info.is_inconsistent());
    }
}
