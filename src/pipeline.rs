//! End-to-end verification of one filing, or many in parallel.
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{ConfigError, VerificationConfig};
use crate::error::VerifyError;
use crate::facts::{FactGroups, GroupSummary};
use crate::network::ScopingDiagnostics;
use crate::scoring::{QualityClassification, QualityClassifier, ScoreCalculator, VerificationScores};
use crate::sign::SignHandler;
use crate::store::{CalculationNetwork, ExtractionStats, MappedStatements};
use crate::validation::{CheckResult, HorizontalChecker, HorizontalSummary, VerticalChecker};

/// Everything needed to verify one filing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilingInput {
    pub filing_id: String,
    pub statements: MappedStatements,
    pub networks: Vec<CalculationNetwork>,
    /// Instance document, or the directory holding it, for sign overrides.
    #[serde(default)]
    pub instance_location: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunDiagnostics {
    pub extraction: ExtractionStats,
    pub groups: GroupSummary,
    pub scoping: ScopingDiagnostics,
    pub horizontal: HorizontalSummary,
    pub sign_overrides: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilingReport {
    pub filing_id: String,
    pub results: Vec<CheckResult>,
    pub scores: VerificationScores,
    pub quality: QualityClassification,
    pub diagnostics: RunDiagnostics,
}

impl FilingReport {
    pub fn failures(&self) -> impl Iterator<Item = &CheckResult> {
        self.results.iter().filter(|r| r.is_failure())
    }
}

#[derive(Debug, Clone)]
pub struct Verifier {
    config: VerificationConfig,
}

impl Verifier {
    pub fn new(config: VerificationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &VerificationConfig {
        &self.config
    }

    pub fn verify(&self, input: &FilingInput) -> FilingReport {
        let config = &self.config;

        // 1. Facts and per-context groups
        let (facts, extraction) = input.statements.to_facts(config.extraction.include_nil);
        let groups = FactGroups::from_facts(&facts, config.tolerance.duplicate_percentage);

        // 2. Sign overrides; an unreadable instance only disables them
        let signs = match &input.instance_location {
            Some(location) => SignHandler::load(location).unwrap_or_else(|e| {
                warn!(filing = %input.filing_id, error = %e, "Sign overrides unavailable");
                SignHandler::empty()
            }),
            None => SignHandler::empty(),
        };

        // 3. Checks
        let horizontal = HorizontalChecker::new(config, &signs).check_all(&groups, &input.networks);
        let vertical = VerticalChecker::new().check_all(&facts);
        let mut results = horizontal.results;
        results.extend(vertical);

        // 4. Scores and quality
        let scores = ScoreCalculator::new(&config.scoring).calculate(&results);
        let quality = QualityClassifier::new(&config.quality).classify(&scores);

        info!(
            filing = %input.filing_id,
            results = results.len(),
            overall = scores.overall_score,
            level = ?quality.level,
            "Filing verified"
        );

        FilingReport {
            filing_id: input.filing_id.clone(),
            results,
            scores,
            quality,
            diagnostics: RunDiagnostics {
                extraction,
                groups: groups.summary(),
                scoping: horizontal.scoping,
                horizontal: horizontal.summary,
                sign_overrides: signs.len(),
            },
        }
    }

    /// Verifies filings in parallel. Reports keep the input order.
    pub fn verify_all(&self, inputs: &[FilingInput]) -> Vec<FilingReport> {
        inputs.par_iter().map(|input| self.verify(input)).collect()
    }
}

pub fn load_statements(path: impl AsRef<Path>) -> Result<MappedStatements, VerifyError> {
    read_json(path.as_ref())
}

pub fn load_networks(path: impl AsRef<Path>) -> Result<Vec<CalculationNetwork>, VerifyError> {
    read_json(path.as_ref())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, VerifyError> {
    let text = std::fs::read_to_string(path).map_err(|e| VerifyError::io(path, e))?;
    serde_json::from_str(&text).map_err(|e| VerifyError::json(path.display().to_string(), e))
}
