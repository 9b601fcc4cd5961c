//! Context classification and fallback compatibility.
use super::period::{PeriodExtractor, PeriodInfo, PeriodType};

/// True when the identifier carries a dimensional qualifier (axis or member).
pub fn is_dimensional(context_id: &str) -> bool {
    let lowered = context_id.to_lowercase();
    lowered.contains("axis") || lowered.contains("member")
}

/// Decides whether a fact in one context may stand in for another.
#[derive(Default)]
pub struct ContextMatcher {
    extractor: PeriodExtractor,
}

impl ContextMatcher {
    pub fn new() -> Self {
        Self { extractor: PeriodExtractor::new() }
    }

    pub fn period(&self, context_id: &str) -> PeriodInfo {
        self.extractor.extract(context_id)
    }

    /// Identical ids, the same period key, or the same known period type and year.
    pub fn are_compatible(&self, a: &str, b: &str) -> bool {
        if a.is_empty() || b.is_empty() {
            return false;
        }
        if a == b {
            return true;
        }
        periods_match(&self.period(a), &self.period(b))
    }

    /// Whether `candidate` may supply a missing child of a calculation whose
    /// parent was reported in `parent`.
    ///
    /// A dimensional parent never falls back, and a default parent never
    /// accepts a dimensional child, unless `allow_dimensional` is set.
    pub fn can_fall_back(&self, parent: &str, candidate: &str, allow_dimensional: bool) -> bool {
        if parent == candidate {
            return false;
        }
        if !allow_dimensional && (is_dimensional(parent) || is_dimensional(candidate)) {
            return false;
        }
        self.are_compatible(parent, candidate)
    }
}

fn periods_match(a: &PeriodInfo, b: &PeriodInfo) -> bool {
    if !a.period_key.is_empty() && a.period_key == b.period_key {
        return true;
    }
    a.period_type != PeriodType::Unknown
        && a.period_type == b.period_type
        && a.year.is_some()
        && a.year == b.year
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("c1-member-X", true)]
    #[case("FY2024_SegmentAxis_Retail", true)]
    #[case("c1", false)]
    #[case("Duration_1_1_2024_To_12_31_2024", false)]
    fn test_is_dimensional(#[case] id: &str, #[case] expected: bool) {
        assert_eq!(is_dimensional(id), expected);
    }

    #[rstest]
    #[case("c1", "c1", true)]
    #[case("AsOf_12_31_2024", "AsOf_2024-12-31", true)]
    #[case("Duration_1_1_2024_To_12_31_2024", "Duration_2024_Annual", true)]
    #[case("AsOf_12_31_2024", "Duration_1_1_2024_To_12_31_2024", false)]
    #[case("c1", "c2", false)]
    #[case("", "", false)]
    fn test_are_compatible(#[case] a: &str, #[case] b: &str, #[case] expected: bool) {
        assert_eq!(ContextMatcher::new().are_compatible(a, b), expected, "{} ~ {}", a, b);
    }

    #[test]
    fn test_dimensional_boundary_requires_opt_in() {
        let matcher = ContextMatcher::new();
        let parent = "AsOf_12_31_2024";
        let child = "AsOf_12_31_2024_SegmentAxis_RetailMember";
        assert!(!matcher.can_fall_back(parent, child, false));
        assert!(matcher.can_fall_back(parent, child, true));
        assert!(!matcher.can_fall_back(child, parent, false));
    }

    #[test]
    fn test_same_context_is_not_a_fallback() {
        assert!(!ContextMatcher::new().can_fall_back("c1", "c1", true));
    }
}
