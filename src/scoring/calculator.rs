//! Category and overall scores derived from check results.
use serde::Serialize;

use crate::config::{ScoringConfig, SeverityPenalties, WeightTable};
use crate::validation::{CheckKind, CheckResult, CheckType, Severity};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct VerificationScores {
    pub horizontal_score: f64,
    pub vertical_score: f64,
    pub library_score: f64,
    pub overall_score: f64,
    /// Evaluated (non-skipped) checks per category.
    pub horizontal_checks: usize,
    pub vertical_checks: usize,
    pub library_checks: usize,
    pub skipped_checks: usize,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub info_issues: usize,
}

impl VerificationScores {
    pub fn category_score(&self, category: CheckType) -> f64 {
        match category {
            CheckType::Horizontal => self.horizontal_score,
            CheckType::Vertical => self.vertical_score,
            CheckType::Library => self.library_score,
        }
    }

    pub fn total_checks(&self) -> usize {
        self.horizontal_checks + self.vertical_checks + self.library_checks
    }
}

#[derive(Default, Clone, Copy)]
struct KindTally {
    seen: bool,
    evaluated: usize,
    passed: usize,
    penalty: f64,
}

pub struct ScoreCalculator<'a> {
    config: &'a ScoringConfig,
    weights: WeightTable,
}

impl<'a> ScoreCalculator<'a> {
    pub fn new(config: &'a ScoringConfig) -> Self {
        Self { config, weights: config.weight_table() }
    }

    pub fn calculate(&self, results: &[CheckResult]) -> VerificationScores {
        let mut scores = VerificationScores::default();

        for result in results {
            if result.skipped {
                scores.skipped_checks += 1;
                continue;
            }
            match result.check_type {
                CheckType::Horizontal => scores.horizontal_checks += 1,
                CheckType::Vertical => scores.vertical_checks += 1,
                CheckType::Library => scores.library_checks += 1,
            }
            if result.is_failure() {
                match result.severity {
                    Severity::Critical => scores.critical_issues += 1,
                    Severity::Warning => scores.warning_issues += 1,
                    Severity::Info => scores.info_issues += 1,
                }
            }
        }

        scores.horizontal_score = self.category_score(results, CheckType::Horizontal);
        scores.vertical_score = self.category_score(results, CheckType::Vertical);
        scores.library_score = self.category_score(results, CheckType::Library);

        let blend = &self.config.category_weights;
        let total_weight = blend.horizontal + blend.vertical + blend.library;
        let weighted: f64 = CheckType::ALL.iter().map(|&c| scores.category_score(c) * blend.get(c)).sum();
        scores.overall_score = if total_weight > 0.0 { clamp_score(weighted / total_weight) } else { 100.0 };

        scores
    }

    /// Weighted score of one category. Categories without results score 100.
    pub fn category_score(&self, results: &[CheckResult], category: CheckType) -> f64 {
        let mut tallies = [KindTally::default(); CheckKind::COUNT];
        let penalties: &SeverityPenalties = &self.config.penalties;

        for result in results.iter().filter(|r| r.check_type == category) {
            let tally = &mut tallies[result.kind.index()];
            tally.seen = true;
            if result.skipped {
                continue;
            }
            tally.evaluated += 1;
            if result.passed == Some(true) {
                tally.passed += 1;
            } else if result.is_failure() {
                tally.penalty += penalties.get(result.severity);
            }
        }

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for kind in CheckKind::ALL.into_iter().filter(|k| k.category() == category) {
            let tally = tallies[kind.index()];
            if !tally.seen {
                continue;
            }
            let weight = self.weights.get(kind);
            let score = if kind.is_aggregate() {
                if tally.evaluated == 0 {
                    100.0
                } else {
                    tally.passed as f64 / tally.evaluated as f64 * 100.0
                }
            } else {
                (100.0 - tally.penalty).max(0.0)
            };
            weighted += score * weight;
            total_weight += weight;
        }

        if total_weight > 0.0 { clamp_score(weighted / total_weight) } else { 100.0 }
    }
}

fn clamp_score(score: f64) -> f64 {
    score.clamp(0.0, 100.0)
}
