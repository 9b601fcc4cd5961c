//! Immutable configuration for a verification run.
//!
//! A `VerificationConfig` is built once (defaults, or JSON with any subset of
//! sections), validated, and then passed by reference into every component.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

use crate::error::VerifyError;
use crate::validation::result::{CheckKind, CheckType, Severity};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Weight for '{name}' must be finite and non-negative, got {value}")]
    InvalidWeight { name: String, value: f64 },
    #[error("Category '{0}' has no positive check weight")]
    EmptyCategory(&'static str),
    #[error("Category weights must sum to a positive value")]
    ZeroCategoryWeights,
    #[error("Quality thresholds must descend within 0..=100, got {0:?}")]
    Thresholds([f64; 4]),
    #[error("Tolerance '{name}' out of range: {value}")]
    Tolerance { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToleranceConfig {
    /// Relative spread under which duplicate values are treated as equal
    /// when the decimal comparison fails.
    pub duplicate_percentage: f64,
    /// Absolute tolerance for undeclared-precision sums below `magnitude_threshold`.
    pub absolute: f64,
    /// Relative tolerance for undeclared-precision sums at or above `magnitude_threshold`.
    pub relative: f64,
    pub magnitude_threshold: f64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self { duplicate_percentage: 0.02, absolute: 1.0, relative: 0.01, magnitude_threshold: 1000.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Lets calculation binding fall back across the dimensional boundary.
    pub allow_dimensional_fallback: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Keep nil facts (as zero) instead of dropping them.
    pub include_nil: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryWeights {
    pub horizontal: f64,
    pub vertical: f64,
    pub library: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self { horizontal: 0.40, vertical: 0.40, library: 0.20 }
    }
}

impl CategoryWeights {
    pub fn get(&self, category: CheckType) -> f64 {
        match category {
            CheckType::Horizontal => self.horizontal,
            CheckType::Vertical => self.vertical,
            CheckType::Library => self.library,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPenalties {
    pub critical: f64,
    pub warning: f64,
    pub info: f64,
}

impl Default for SeverityPenalties {
    fn default() -> Self {
        Self { critical: 25.0, warning: 5.0, info: 0.5 }
    }
}

impl SeverityPenalties {
    pub fn get(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Critical => self.critical,
            Severity::Warning => self.warning,
            Severity::Info => self.info,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub category_weights: CategoryWeights,
    pub penalties: SeverityPenalties,
    /// Per check-kind weights replacing the built-in defaults.
    pub check_weights: BTreeMap<CheckKind, f64>,
}

/// Resolved weight of every check kind, indexed by `CheckKind::index`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightTable {
    weights: [f64; CheckKind::COUNT],
}

impl WeightTable {
    #[inline(always)]
    pub fn get(&self, kind: CheckKind) -> f64 {
        self.weights[kind.index()]
    }
}

impl ScoringConfig {
    pub fn weight_table(&self) -> WeightTable {
        let mut weights = [0.0; CheckKind::COUNT];
        for kind in CheckKind::ALL {
            weights[kind.index()] = self.check_weights.get(&kind).copied().unwrap_or(kind.default_weight());
        }
        WeightTable { weights }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityThresholds {
    pub excellent: f64,
    pub good: f64,
    pub fair: f64,
    pub poor: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self { excellent: 90.0, good: 75.0, fair: 50.0, poor: 25.0 }
    }
}

impl QualityThresholds {
    pub fn as_array(&self) -> [f64; 4] {
        [self.excellent, self.good, self.fair, self.poor]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportingConfig {
    /// Maximum inconsistent duplicate sets listed in a single result.
    pub max_duplicates_shown: usize,
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self { max_duplicates_shown: 20 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub tolerance: ToleranceConfig,
    pub binding: BindingConfig,
    pub extraction: ExtractionConfig,
    pub scoring: ScoringConfig,
    pub quality: QualityThresholds,
    pub reporting: ReportingConfig,
}

impl VerificationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, VerifyError> {
        let config: Self = serde_json::from_str(json).map_err(|e| VerifyError::json("configuration", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| VerifyError::io(path, e))?;
        let config: Self =
            serde_json::from_str(&text).map_err(|e| VerifyError::json(path.display().to_string(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every weight, threshold and tolerance.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;

        // 1. Tolerances
        let tol = &self.tolerance;
        for (name, value) in [
            ("duplicate_percentage", tol.duplicate_percentage),
            ("absolute", tol.absolute),
            ("relative", tol.relative),
            ("magnitude_threshold", tol.magnitude_threshold),
        ] {
            if !valid(value) {
                return Err(ConfigError::Tolerance { name, value });
            }
        }
        if tol.duplicate_percentage >= 1.0 {
            return Err(ConfigError::Tolerance { name: "duplicate_percentage", value: tol.duplicate_percentage });
        }

        // 2. Check-kind weights, exhaustively
        let table = self.scoring.weight_table();
        for kind in CheckKind::ALL {
            let w = table.get(kind);
            if !valid(w) {
                return Err(ConfigError::InvalidWeight { name: kind.name().to_string(), value: w });
            }
        }
        for category in CheckType::ALL {
            let total: f64 = CheckKind::ALL.iter().filter(|k| k.category() == category).map(|&k| table.get(k)).sum();
            if total <= 0.0 {
                return Err(ConfigError::EmptyCategory(category.name()));
            }
        }

        // 3. Category blend and penalties
        let cw = &self.scoring.category_weights;
        let penalties = &self.scoring.penalties;
        for (name, value) in [
            ("horizontal", cw.horizontal),
            ("vertical", cw.vertical),
            ("library", cw.library),
            ("critical", penalties.critical),
            ("warning", penalties.warning),
            ("info", penalties.info),
        ] {
            if !valid(value) {
                return Err(ConfigError::InvalidWeight { name: name.to_string(), value });
            }
        }
        if cw.horizontal + cw.vertical + cw.library <= 0.0 {
            return Err(ConfigError::ZeroCategoryWeights);
        }

        // 4. Quality tiers
        let t = self.quality.as_array();
        let in_range = t.iter().all(|v| (0.0..=100.0).contains(v));
        let descending = t.windows(2).all(|w| w[0] > w[1]);
        if !in_range || !descending {
            return Err(ConfigError::Thresholds(t));
        }

        Ok(())
    }
}
