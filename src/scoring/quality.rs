use serde::Serialize;
use tracing::{debug, info};

use super::calculator::VerificationScores;
use crate::config::QualityThresholds;

const BORDERLINE_DISTANCE: f64 = 5.0;
const BORDERLINE_PENALTY: f64 = 0.15;
const VARIANCE_LIMIT: f64 = 400.0;
const VARIANCE_PENALTY: f64 = 0.2;
const MIN_CHECKS: usize = 5;
const FEW_CHECKS_PENALTY: f64 = 0.15;
const CONCERN_SCORE: f64 = 70.0;
const FLOOR_SCORE: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QualityLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Unusable,
}

impl QualityLevel {
    pub fn description(self) -> &'static str {
        match self {
            QualityLevel::Excellent => "Fully consistent, ready for financial analysis",
            QualityLevel::Good => "Minor issues, usable with standard caution",
            QualityLevel::Fair => "Notable issues, limited analysis value",
            QualityLevel::Poor => "Significant issues, use at own risk",
            QualityLevel::Unusable => "Major inconsistencies, not recommended for analysis",
        }
    }

    pub fn recommendation(self) -> &'static str {
        match self {
            QualityLevel::Excellent => "Filing is suitable for comprehensive financial analysis.",
            QualityLevel::Good => "Filing is suitable for analysis. Review flagged warnings.",
            QualityLevel::Fair => "Use with caution. Manual verification of key figures recommended.",
            QualityLevel::Poor => "Significant issues detected. Consider alternative data sources.",
            QualityLevel::Unusable => "Do not use for analysis. Data integrity compromised.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityFactors {
    pub overall_score: f64,
    pub horizontal_score: f64,
    pub vertical_score: f64,
    pub library_score: f64,
    pub critical_issues: usize,
    pub warning_issues: usize,
    pub total_checks: usize,
    pub concerns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityClassification {
    pub level: QualityLevel,
    pub description: &'static str,
    pub recommendation: &'static str,
    pub confidence: f64,
    pub factors: QualityFactors,
}

/// Maps verification scores onto a five-tier quality level.
pub struct QualityClassifier {
    thresholds: QualityThresholds,
}

impl QualityClassifier {
    pub fn new(thresholds: &QualityThresholds) -> Self {
        Self { thresholds: thresholds.clone() }
    }

    pub fn classify(&self, scores: &VerificationScores) -> QualityClassification {
        let base = self.base_level(scores.overall_score);
        let level = adjust_for_issues(base, scores);
        if level != base {
            debug!(from = ?base, to = ?level, critical = scores.critical_issues, "Quality level downgraded");
        }
        let confidence = self.confidence(scores);
        info!(level = ?level, overall = scores.overall_score, confidence, "Quality classified");

        QualityClassification {
            level,
            description: level.description(),
            recommendation: level.recommendation(),
            confidence,
            factors: collect_factors(scores),
        }
    }

    fn base_level(&self, overall: f64) -> QualityLevel {
        let t = &self.thresholds;
        if overall >= t.excellent {
            QualityLevel::Excellent
        } else if overall >= t.good {
            QualityLevel::Good
        } else if overall >= t.fair {
            QualityLevel::Fair
        } else if overall >= t.poor {
            QualityLevel::Poor
        } else {
            QualityLevel::Unusable
        }
    }

    fn confidence(&self, scores: &VerificationScores) -> f64 {
        let mut confidence = 1.0;

        for threshold in self.thresholds.as_array() {
            if (scores.overall_score - threshold).abs() < BORDERLINE_DISTANCE {
                confidence -= BORDERLINE_PENALTY;
            }
        }

        if variance(&[scores.horizontal_score, scores.vertical_score, scores.library_score]) > VARIANCE_LIMIT {
            confidence -= VARIANCE_PENALTY;
        }

        if scores.total_checks() < MIN_CHECKS {
            confidence -= FEW_CHECKS_PENALTY;
        }

        f64::clamp(confidence, 0.0, 1.0)
    }
}

// Downgrades only; a level never improves here.
fn adjust_for_issues(level: QualityLevel, scores: &VerificationScores) -> QualityLevel {
    let mut level = level;
    if scores.critical_issues > 0 {
        level = match level {
            QualityLevel::Excellent => QualityLevel::Good,
            QualityLevel::Good if scores.critical_issues >= 2 => QualityLevel::Fair,
            other => other,
        };
    }
    if (scores.horizontal_score < FLOOR_SCORE || scores.vertical_score < FLOOR_SCORE) && level < QualityLevel::Fair {
        level = QualityLevel::Fair;
    }
    level
}

fn variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n
}

fn collect_factors(scores: &VerificationScores) -> QualityFactors {
    let mut concerns = Vec::new();
    if scores.horizontal_score < CONCERN_SCORE {
        concerns.push("Low horizontal (calculation) score".to_string());
    }
    if scores.vertical_score < CONCERN_SCORE {
        concerns.push("Low vertical (cross-statement) score".to_string());
    }
    if scores.critical_issues > 0 {
        concerns.push(format!("{} critical issue(s) found", scores.critical_issues));
    }

    QualityFactors {
        overall_score: scores.overall_score,
        horizontal_score: scores.horizontal_score,
        vertical_score: scores.vertical_score,
        library_score: scores.library_score,
        critical_issues: scores.critical_issues,
        warning_issues: scores.warning_issues,
        total_checks: scores.total_checks(),
        concerns,
    }
}
