//! Decides whether a (role, parent) calculation can be evaluated in a context.
//!
//! Binding walks `NotAttempted -> ExactBound | FallbackBound | Unbound`.
//! Exact binding needs the parent and every child in the same context.
//! Missing children may then be resolved from a compatible context, but
//! only when exactly one compatible value exists.
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use super::result::ChildSource;
use crate::analysis::ContextMatcher;
use crate::config::BindingConfig;
use crate::facts::{ConceptOccurrence, FactGroups};
use crate::network::ScopedCalculation;
use crate::store::{Decimals, Unit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnboundReason {
    ParentMissing,
    InconsistentParent,
    InconsistentChild,
    UnitMismatch,
    ChildrenMissing,
}

impl UnboundReason {
    pub fn as_str(self) -> &'static str {
        match self {
            UnboundReason::ParentMissing => "parent_missing",
            UnboundReason::InconsistentParent => "inconsistent_parent",
            UnboundReason::InconsistentChild => "inconsistent_child",
            UnboundReason::UnitMismatch => "unit_mismatch",
            UnboundReason::ChildrenMissing => "children_missing",
        }
    }
}

impl fmt::Display for UnboundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingStatus {
    NotAttempted,
    ExactBound,
    FallbackBound,
    Unbound(UnboundReason),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedParent {
    pub original_concept: String,
    pub value: f64,
    pub decimals: Decimals,
    pub unit: Option<Unit>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChild {
    pub concept: String,
    pub original_concept: String,
    pub context_id: String,
    pub value: f64,
    pub decimals: Decimals,
    pub weight: f64,
    pub source: ChildSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BindingResult {
    pub status: BindingStatus,
    pub message: String,
    pub parent: Option<ResolvedParent>,
    pub resolved_children: Vec<ResolvedChild>,
    /// Children with no usable value, including ambiguous ones.
    pub children_missing: Vec<String>,
    /// Children with more than one compatible fallback value.
    pub ambiguous: Vec<String>,
}

impl BindingResult {
    fn new() -> Self {
        Self {
            status: BindingStatus::NotAttempted,
            message: String::new(),
            parent: None,
            resolved_children: Vec::new(),
            children_missing: Vec::new(),
            ambiguous: Vec::new(),
        }
    }

    fn unbound(mut self, reason: UnboundReason, message: String) -> Self {
        self.status = BindingStatus::Unbound(reason);
        self.message = message;
        self
    }

    pub fn binds(&self) -> bool {
        matches!(self.status, BindingStatus::ExactBound | BindingStatus::FallbackBound)
    }

    pub fn unbound_reason(&self) -> Option<UnboundReason> {
        match self.status {
            BindingStatus::Unbound(reason) => Some(reason),
            _ => None,
        }
    }
}

enum Fallback {
    Found(ResolvedChild),
    Missing,
    Ambiguous,
}

pub struct BindingChecker<'a> {
    groups: &'a FactGroups,
    /// Cross-context view searched by fallback, built once per run.
    by_concept: BTreeMap<&'a str, Vec<ConceptOccurrence<'a>>>,
    matcher: &'a ContextMatcher,
    config: &'a BindingConfig,
}

impl<'a> BindingChecker<'a> {
    pub fn new(groups: &'a FactGroups, matcher: &'a ContextMatcher, config: &'a BindingConfig) -> Self {
        Self { groups, by_concept: groups.all_facts_by_concept(), matcher, config }
    }

    pub fn check(&self, calc: &ScopedCalculation, context_id: &str) -> BindingResult {
        let result = BindingResult::new();

        // 1. Parent in the exact context
        let Some(group) = self.groups.get_context(context_id) else {
            return result.unbound(UnboundReason::ParentMissing, format!("Context {} not found", context_id));
        };
        let Some(parent_info) = group.get(&calc.parent_concept) else {
            return result.unbound(
                UnboundReason::ParentMissing,
                format!("{} not reported in {}", calc.parent_original, context_id),
            );
        };
        let Some(selected) = parent_info.selected() else {
            return result.unbound(
                UnboundReason::InconsistentParent,
                format!("{} has inconsistent duplicates in {}", calc.parent_original, context_id),
            );
        };
        let parent = ResolvedParent {
            original_concept: selected.original_concept.clone(),
            value: selected.value,
            decimals: selected.decimals,
            unit: parent_info.unit().cloned(),
        };

        let mut result = result;

        // 2. Children in the exact context
        let mut pending = Vec::new();
        for child in &calc.children {
            let Some(info) = group.get(&child.concept) else {
                pending.push(child);
                continue;
            };
            let Some(entry) = info.selected() else {
                return result.unbound(
                    UnboundReason::InconsistentChild,
                    format!("{} has inconsistent duplicates in {}", child.original_concept, context_id),
                );
            };
            if !Unit::matches(parent.unit.as_ref(), info.unit()) {
                return result.unbound(
                    UnboundReason::UnitMismatch,
                    format!(
                        "{} unit {} differs from parent unit {}",
                        child.original_concept,
                        info.unit().map_or("?".to_string(), Unit::to_string),
                        parent.unit.as_ref().map_or("?".to_string(), Unit::to_string),
                    ),
                );
            }
            result.resolved_children.push(ResolvedChild {
                concept: child.concept.clone(),
                original_concept: entry.original_concept.clone(),
                context_id: context_id.to_string(),
                value: entry.value,
                decimals: entry.decimals,
                weight: child.weight,
                source: ChildSource::Exact,
            });
        }

        if pending.is_empty() {
            result.status = BindingStatus::ExactBound;
            result.message = format!("All {} children found in {}", calc.children.len(), context_id);
            result.parent = Some(parent);
            return result;
        }

        // 3. Fallback for the missing children
        for child in pending {
            match self.fallback(&child.concept, child.weight, context_id, parent.unit.as_ref()) {
                Fallback::Found(resolved) => result.resolved_children.push(resolved),
                Fallback::Missing => result.children_missing.push(child.original_concept.clone()),
                Fallback::Ambiguous => {
                    result.ambiguous.push(child.original_concept.clone());
                    result.children_missing.push(child.original_concept.clone());
                }
            }
        }

        result.parent = Some(parent);
        if result.children_missing.is_empty() {
            result.status = BindingStatus::FallbackBound;
            result.message = format!(
                "Bound in {} with {} fallback children",
                context_id,
                result.resolved_children.iter().filter(|c| c.source == ChildSource::Fallback).count()
            );
            return result;
        }

        let message = format!(
            "Missing {} of {} children in {}: {}",
            result.children_missing.len(),
            calc.children.len(),
            context_id,
            result.children_missing.join(", ")
        );
        result.unbound(UnboundReason::ChildrenMissing, message)
    }

    fn fallback(&self, concept: &str, weight: f64, context_id: &str, parent_unit: Option<&Unit>) -> Fallback {
        let allow = self.config.allow_dimensional_fallback;
        let mut candidates = self
            .by_concept
            .get(concept)
            .into_iter()
            .flatten()
            .filter(|o| self.matcher.can_fall_back(context_id, o.context_id, allow))
            .filter(|o| Unit::matches(parent_unit, o.unit));

        let Some(first) = candidates.next() else {
            return Fallback::Missing;
        };
        // Several contexts reporting the same value still count as one value.
        if candidates.any(|o| o.value != first.value) {
            return Fallback::Ambiguous;
        }

        Fallback::Found(ResolvedChild {
            concept: concept.to_string(),
            original_concept: first.original_concept.to_string(),
            context_id: first.context_id.to_string(),
            value: first.value,
            decimals: first.decimals,
            weight,
            source: ChildSource::Fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::RoleScopedCalculations;
    use crate::store::{CalculationArc, CalculationNetwork, Fact};

    const ROLE: &str = "http://example.com/role/BalanceSheet";

    fn calc(parent: &str, children: &[&str]) -> ScopedCalculation {
        let arcs = children.iter().map(|c| CalculationArc::new(parent, *c, 1.0)).collect();
        let scoped = RoleScopedCalculations::from_networks(&[CalculationNetwork::new(ROLE, arcs)]);
        let first = scoped.iter().next().cloned().unwrap();
        first
    }

    fn bind(facts: &[Fact], calc: &ScopedCalculation, ctx: &str, allow_dimensional: bool) -> BindingResult {
        let groups = FactGroups::from_facts(facts, 0.02);
        let matcher = ContextMatcher::new();
        let config = BindingConfig { allow_dimensional_fallback: allow_dimensional };
        BindingChecker::new(&groups, &matcher, &config).check(calc, ctx)
    }

    #[test]
    fn test_exact_binding() {
        let c = calc("Assets", &["AssetsCurrent", "AssetsNoncurrent"]);
        let facts = [
            Fact::new("Assets", 1000.0, "c1"),
            Fact::new("AssetsCurrent", 600.0, "c1"),
            Fact::new("AssetsNoncurrent", 400.0, "c1"),
        ];
        let r = bind(&facts, &c, "c1", false);
        assert_eq!(r.status, BindingStatus::ExactBound);
        assert!(r.binds());
        assert_eq!(r.resolved_children.len(), 2);
        assert_eq!(r.parent.map(|p| p.value), Some(1000.0));
    }

    #[test]
    fn test_missing_child_is_unbound_with_diagnostics() {
        let c = calc("Assets", &["AssetsCurrent", "AssetsNoncurrent"]);
        let facts = [Fact::new("Assets", 1000.0, "c1"), Fact::new("AssetsCurrent", 600.0, "c1")];
        let r = bind(&facts, &c, "c1", false);
        assert_eq!(r.status, BindingStatus::Unbound(UnboundReason::ChildrenMissing));
        assert_eq!(r.children_missing, vec!["AssetsNoncurrent".to_string()]);
        assert!(!r.binds());
    }

    #[test]
    fn test_fallback_to_compatible_period() {
        let c = calc("Assets", &["AssetsCurrent", "AssetsNoncurrent"]);
        let facts = [
            Fact::new("Assets", 1000.0, "AsOf_12_31_2024"),
            Fact::new("AssetsCurrent", 600.0, "AsOf_12_31_2024"),
            Fact::new("AssetsNoncurrent", 400.0, "AsOf_2024-12-31"),
        ];
        let r = bind(&facts, &c, "AsOf_12_31_2024", false);
        assert_eq!(r.status, BindingStatus::FallbackBound);
        let fb = r.resolved_children.iter().find(|c| c.source == ChildSource::Fallback).unwrap();
        assert_eq!(fb.context_id, "AsOf_2024-12-31");
        assert_eq!(fb.value, 400.0);
    }

    #[test]
    fn test_ambiguous_fallback_is_unresolved() {
        let c = calc("Assets", &["AssetsCurrent", "AssetsNoncurrent"]);
        let facts = [
            Fact::new("Assets", 1000.0, "AsOf_12_31_2024"),
            Fact::new("AssetsCurrent", 600.0, "AsOf_12_31_2024"),
            Fact::new("AssetsNoncurrent", 400.0, "AsOf_2024-12-31"),
            Fact::new("AssetsNoncurrent", 410.0, "Instant_2024_12_31"),
        ];
        let r = bind(&facts, &c, "AsOf_12_31_2024", false);
        assert_eq!(r.status, BindingStatus::Unbound(UnboundReason::ChildrenMissing));
        assert_eq!(r.ambiguous, vec!["AssetsNoncurrent".to_string()]);
    }

    #[test]
    fn test_dimensional_child_rejected_without_opt_in() {
        let c = calc("Assets", &["AssetsCurrent"]);
        let facts = [
            Fact::new("Assets", 1000.0, "AsOf_12_31_2024"),
            Fact::new("AssetsCurrent", 1000.0, "AsOf_12_31_2024_SegmentAxis_RetailMember"),
        ];
        assert!(!bind(&facts, &c, "AsOf_12_31_2024", false).binds());
        assert_eq!(bind(&facts, &c, "AsOf_12_31_2024", true).status, BindingStatus::FallbackBound);
    }

    #[test]
    fn test_inconsistent_parent_and_child_block_binding() {
        let c = calc("Assets", &["AssetsCurrent"]);
        let parent_dup = [
            Fact::new("Assets", 1000.0, "c1").with_decimals(Decimals::Finite(0)),
            Fact::new("Assets", 1500.0, "c1").with_decimals(Decimals::Finite(0)),
            Fact::new("AssetsCurrent", 1000.0, "c1"),
        ];
        assert_eq!(bind(&parent_dup, &c, "c1", false).unbound_reason(), Some(UnboundReason::InconsistentParent));

        let child_dup = [
            Fact::new("Assets", 1000.0, "c1"),
            Fact::new("AssetsCurrent", 1000.0, "c1").with_decimals(Decimals::Finite(0)),
            Fact::new("AssetsCurrent", 700.0, "c1").with_decimals(Decimals::Finite(0)),
        ];
        assert_eq!(bind(&child_dup, &c, "c1", false).unbound_reason(), Some(UnboundReason::InconsistentChild));
    }

    #[test]
    fn test_unit_mismatch_blocks_binding() {
        let c = calc("Assets", &["AssetsCurrent"]);
        let facts = [
            Fact::new("Assets", 1000.0, "c1").with_unit("iso4217:USD"),
            Fact::new("AssetsCurrent", 1000.0, "c1").with_unit("iso4217:EUR"),
        ];
        assert_eq!(bind(&facts, &c, "c1", false).unbound_reason(), Some(UnboundReason::UnitMismatch));
    }
}
