//! Rule for weighted summation of a bound calculation.
use crate::analysis::tolerance::within_tolerance;
use crate::config::ToleranceConfig;
use crate::network::ScopedCalculation;
use crate::sign::SignHandler;
use crate::store::Decimals;
use crate::validation::binding::{BindingResult, UnboundReason};
use crate::validation::result::{
    CalculationDetails, CheckDetails, CheckKind, CheckResult, ChildContribution, MismatchDirection, Severity,
    SkipDetails,
};

/// Compares the parent with `Σ weight × signed(child)` at the lesser precision
/// of the parent and its children.
pub(crate) fn verify_calculation(
    calc: &ScopedCalculation,
    context_id: &str,
    binding: &BindingResult,
    signs: &SignHandler,
    tolerance: &ToleranceConfig,
) -> CheckResult {
    let Some(parent) = binding.parent.as_ref().filter(|_| binding.binds()) else {
        let reason = binding.unbound_reason().unwrap_or(UnboundReason::ParentMissing);
        return skipped_calculation(calc, context_id, reason, &binding.children_missing, &binding.message);
    };

    let parent_signed = signs.apply(parent.value, &parent.original_concept, context_id);

    let mut sum = 0.0;
    let mut child_decimals = Decimals::Unbounded;
    let mut children = Vec::with_capacity(binding.resolved_children.len());
    for child in &binding.resolved_children {
        let signed = signs.apply(child.value, &child.original_concept, &child.context_id);
        let weighted = signed.value * child.weight;
        sum += weighted;
        child_decimals = child_decimals.lesser(child.decimals);
        children.push(ChildContribution {
            concept: child.original_concept.clone(),
            context_id: child.context_id.clone(),
            source: child.source,
            value: child.value,
            corrected_value: signed.value,
            weight: child.weight,
            weighted,
            decimals: child.decimals,
            sign_corrected: signed.corrected,
        });
    }

    let actual = parent_signed.value;
    let outcome = within_tolerance(sum, actual, child_decimals, parent.decimals, tolerance);
    let difference = (actual - sum).abs();
    let corrections = children.iter().filter(|c| c.sign_corrected).count() + usize::from(parent_signed.corrected);

    let direction = (!outcome.equal).then(|| {
        if sum != 0.0 && actual != 0.0 && sum.signum() != actual.signum() {
            MismatchDirection::SignMismatch
        } else if sum > actual {
            MismatchDirection::Overshoot
        } else {
            MismatchDirection::Undershoot
        }
    });

    let details = CheckDetails::Calculation(CalculationDetails {
        role: calc.role.clone(),
        role_name: calc.role_name.clone(),
        parent_concept: calc.parent_original.clone(),
        context_id: context_id.to_string(),
        depth: calc.depth,
        parent_sign_corrected: parent_signed.corrected,
        children,
        sign_corrections_applied: corrections,
        comparison_decimals: outcome.comparison_decimals,
        rounded_difference: outcome.difference,
        direction,
    });

    let result = if outcome.equal {
        CheckResult::pass(
            CheckKind::CalculationConsistency,
            format!("{} = {} in {} ({})", calc.parent_original, sum, context_id, calc.role_name),
        )
    } else {
        CheckResult::fail(
            CheckKind::CalculationConsistency,
            Severity::Critical,
            format!(
                "{} in {} ({}): reported {}, children sum to {}, difference {}",
                calc.parent_original, context_id, calc.role_name, actual, sum, difference
            ),
        )
    };

    result.with_values(sum, actual, difference).with_details(details)
}

/// A calculation that cannot be evaluated. Never a failure.
pub(crate) fn skipped_calculation(
    calc: &ScopedCalculation,
    context_id: &str,
    reason: UnboundReason,
    children_missing: &[String],
    message: &str,
) -> CheckResult {
    CheckResult::skip(
        CheckKind::CalculationConsistency,
        format!("Skipped {} in {} ({}): {}", calc.parent_original, context_id, calc.role_name, message),
    )
    .with_details(CheckDetails::Skipped(SkipDetails {
        role: calc.role.clone(),
        parent_concept: calc.parent_original.clone(),
        context_id: context_id.to_string(),
        reason: reason.as_str().to_string(),
        children_missing: children_missing.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::binding::{BindingStatus, ResolvedChild, ResolvedParent};
    use crate::validation::result::ChildSource;

    fn calc() -> ScopedCalculation {
        ScopedCalculation {
            role: "http://example.com/role/IncomeStatement".into(),
            role_name: "IncomeStatement".into(),
            parent_concept: "netincomeloss".into(),
            parent_original: "us-gaap:NetIncomeLoss".into(),
            children: Vec::new(),
            depth: 0,
        }
    }

    fn child(name: &str, value: f64, weight: f64, decimals: Decimals) -> ResolvedChild {
        ResolvedChild {
            concept: name.to_lowercase(),
            original_concept: name.to_string(),
            context_id: "FY2024".into(),
            value,
            decimals,
            weight,
            source: ChildSource::Exact,
        }
    }

    fn binding(parent: f64, parent_decimals: Decimals, children: Vec<ResolvedChild>) -> BindingResult {
        BindingResult {
            status: BindingStatus::ExactBound,
            message: String::new(),
            parent: Some(ResolvedParent {
                original_concept: "us-gaap:NetIncomeLoss".into(),
                value: parent,
                decimals: parent_decimals,
                unit: None,
            }),
            resolved_children: children,
            children_missing: Vec::new(),
            ambiguous: Vec::new(),
        }
    }

    #[test]
    fn test_negative_weight_subtracts() {
        let b = binding(300.0, Decimals::Finite(0), vec![
            child("Revenue", 500.0, 1.0, Decimals::Finite(0)),
            child("Expenses", 200.0, -1.0, Decimals::Finite(0)),
        ]);
        let r = verify_calculation(&calc(), "FY2024", &b, &SignHandler::empty(), &ToleranceConfig::default());
        assert_eq!(r.passed, Some(true));
        assert_eq!(r.expected_value, Some(300.0));
        assert_eq!(r.difference, Some(0.0));
    }

    #[test]
    fn test_mismatch_is_critical_with_direction() {
        let b = binding(250.0, Decimals::Finite(0), vec![
            child("Revenue", 500.0, 1.0, Decimals::Finite(0)),
            child("Expenses", 200.0, -1.0, Decimals::Finite(0)),
        ]);
        let r = verify_calculation(&calc(), "FY2024", &b, &SignHandler::empty(), &ToleranceConfig::default());
        assert_eq!(r.passed, Some(false));
        assert_eq!(r.severity, Severity::Critical);
        assert_eq!(r.difference, Some(50.0));
        match r.details {
            CheckDetails::Calculation(d) => assert_eq!(d.direction, Some(MismatchDirection::Overshoot)),
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_coarse_child_precision_absorbs_rounding() {
        // Children reported in thousands, parent to the unit.
        let b = binding(1_000_400.0, Decimals::Finite(0), vec![
            child("A", 600_000.0, 1.0, Decimals::Finite(-3)),
            child("B", 400_000.0, 1.0, Decimals::Finite(-3)),
        ]);
        let r = verify_calculation(&calc(), "FY2024", &b, &SignHandler::empty(), &ToleranceConfig::default());
        assert_eq!(r.passed, Some(true));
        assert_eq!(r.difference, Some(400.0));
    }

    #[test]
    fn test_inline_sign_override_reconciles_with_weight() {
        let mut signs = SignHandler::empty();
        signs.insert("OtherExpense", "FY2024");
        // Mapped as positive 50 but declared negative inline, then added with weight +1.
        let b = binding(450.0, Decimals::Finite(0), vec![
            child("Revenue", 500.0, 1.0, Decimals::Finite(0)),
            child("OtherExpense", 50.0, 1.0, Decimals::Finite(0)),
        ]);
        let r = verify_calculation(&calc(), "FY2024", &b, &signs, &ToleranceConfig::default());
        assert_eq!(r.passed, Some(true));
        match r.details {
            CheckDetails::Calculation(d) => assert_eq!(d.sign_corrections_applied, 1),
            other => panic!("unexpected details {:?}", other),
        }
    }

    #[test]
    fn test_unbound_binding_becomes_skip() {
        let mut b = binding(1.0, Decimals::Finite(0), Vec::new());
        b.status = BindingStatus::Unbound(UnboundReason::ChildrenMissing);
        b.children_missing = vec!["Expenses".into()];
        let r = verify_calculation(&calc(), "FY2024", &b, &SignHandler::empty(), &ToleranceConfig::default());
        assert!(r.skipped);
        assert_eq!(r.passed, None);
        assert!(!r.is_failure());
    }
}
