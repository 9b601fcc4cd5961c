//! The orchestrator for per-context calculation and duplicate checks.
use serde::Serialize;
use tracing::{debug, info, warn};

use super::binding::{BindingChecker, BindingStatus};
use super::result::{CheckDetails, CheckKind, CheckResult};
use super::rules::{calculation, duplicates};
use crate::analysis::ContextMatcher;
use crate::config::VerificationConfig;
use crate::facts::FactGroups;
use crate::network::{RoleScopedCalculations, ScopingDiagnostics};
use crate::sign::SignHandler;
use crate::store::CalculationNetwork;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HorizontalSummary {
    pub contexts: usize,
    pub calculations: usize,
    pub evaluated: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub exact_bound: usize,
    pub fallback_bound: usize,
}

#[derive(Debug, Clone, Default)]
pub struct HorizontalOutcome {
    pub results: Vec<CheckResult>,
    pub summary: HorizontalSummary,
    pub scoping: ScopingDiagnostics,
}

/// Runs duplicate reporting, then every (role, parent, context) calculation.
pub struct HorizontalChecker<'a> {
    config: &'a VerificationConfig,
    signs: &'a SignHandler,
    matcher: ContextMatcher,
}

impl<'a> HorizontalChecker<'a> {
    pub fn new(config: &'a VerificationConfig, signs: &'a SignHandler) -> Self {
        Self { config, signs, matcher: ContextMatcher::new() }
    }

    pub fn check_all(&self, groups: &FactGroups, networks: &[CalculationNetwork]) -> HorizontalOutcome {
        let mut outcome = HorizontalOutcome::default();

        // --- PHASE 1: PRECONDITIONS ---
        if groups.is_empty() {
            warn!("No contexts found, nothing to verify");
            return outcome;
        }
        outcome.summary.contexts = groups.context_count();

        // --- PHASE 2: DUPLICATES ---
        let cap = self.config.reporting.max_duplicates_shown;
        let inconsistent = duplicates::validate_inconsistent_duplicates(groups, cap);
        let reliant = duplicates::validate_percentage_reliance(groups, cap);
        if let Some(result) = &inconsistent {
            warn!(message = %result.message, "Inconsistent duplicate facts");
        }
        if inconsistent.is_none() && reliant.is_none() {
            outcome.results.push(
                CheckResult::pass(CheckKind::DuplicateFacts, "No inconsistent duplicate facts")
                    .with_details(CheckDetails::Summary { evaluated: groups.summary().duplicate_sets }),
            );
        }
        outcome.results.extend(inconsistent);
        outcome.results.extend(reliant);

        // --- PHASE 3: ROLE-SCOPED CALCULATIONS ---
        let scoped = RoleScopedCalculations::from_networks(networks);
        outcome.scoping = scoped.diagnostics().clone();
        if scoped.is_empty() {
            warn!("No calculation arcs available, skipping calculation checks");
            return outcome;
        }
        outcome.summary.calculations = scoped.len();

        let binder = BindingChecker::new(groups, &self.matcher, &self.config.binding);
        for calc in scoped.iter() {
            for context_id in groups.contexts_with_concept(&calc.parent_concept) {
                let binding = binder.check(calc, context_id);
                match binding.status {
                    BindingStatus::ExactBound => outcome.summary.exact_bound += 1,
                    BindingStatus::FallbackBound => outcome.summary.fallback_bound += 1,
                    _ => debug!(
                        role = %calc.role_name,
                        parent = %calc.parent_original,
                        context = context_id,
                        reason = %binding.message,
                        "Calculation does not bind"
                    ),
                }

                let result =
                    calculation::verify_calculation(calc, context_id, &binding, self.signs, &self.config.tolerance);
                if result.skipped {
                    outcome.summary.skipped += 1;
                } else {
                    outcome.summary.evaluated += 1;
                    if result.passed == Some(true) {
                        outcome.summary.passed += 1;
                    } else {
                        outcome.summary.failed += 1;
                    }
                }
                outcome.results.push(result);
            }
        }

        // --- PHASE 4: SUMMARY ---
        info!(
            contexts = outcome.summary.contexts,
            calculations = outcome.summary.calculations,
            passed = outcome.summary.passed,
            failed = outcome.summary.failed,
            skipped = outcome.summary.skipped,
            "Horizontal verification complete"
        );
        outcome
    }
}
