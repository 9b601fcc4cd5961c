//! The structured outcome of every verification check.
use serde::{Deserialize, Serialize};

use crate::store::Decimals;

/// The category a check belongs to for scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    Horizontal,
    Vertical,
    Library,
}

impl CheckType {
    pub const ALL: [CheckType; 3] = [CheckType::Horizontal, CheckType::Vertical, CheckType::Library];

    pub fn name(self) -> &'static str {
        match self {
            CheckType::Horizontal => "horizontal",
            CheckType::Vertical => "vertical",
            CheckType::Library => "library",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

/// Every kind of check the scoring layer knows how to weigh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckKind {
    // Horizontal
    CalculationConsistency,
    TotalReconciliation,
    SignConvention,
    DuplicateFacts,
    // Vertical
    XbrlCalculationCompany,
    XbrlCalculationTaxonomy,
    BalanceSheetEquation,
    IncomeStatementLinkage,
    CashFlowLinkage,
    RetainedEarningsRollforward,
    CommonValuesConsistency,
    // Library
    ConceptValidity,
    PeriodTypeMatch,
    BalanceTypeMatch,
    DataTypeMatch,
}

impl CheckKind {
    pub const COUNT: usize = 15;

    pub const ALL: [CheckKind; CheckKind::COUNT] = [
        CheckKind::CalculationConsistency,
        CheckKind::TotalReconciliation,
        CheckKind::SignConvention,
        CheckKind::DuplicateFacts,
        CheckKind::XbrlCalculationCompany,
        CheckKind::XbrlCalculationTaxonomy,
        CheckKind::BalanceSheetEquation,
        CheckKind::IncomeStatementLinkage,
        CheckKind::CashFlowLinkage,
        CheckKind::RetainedEarningsRollforward,
        CheckKind::CommonValuesConsistency,
        CheckKind::ConceptValidity,
        CheckKind::PeriodTypeMatch,
        CheckKind::BalanceTypeMatch,
        CheckKind::DataTypeMatch,
    ];

    #[inline(always)]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            CheckKind::CalculationConsistency => "calculation_consistency",
            CheckKind::TotalReconciliation => "total_reconciliation",
            CheckKind::SignConvention => "sign_convention",
            CheckKind::DuplicateFacts => "duplicate_facts",
            CheckKind::XbrlCalculationCompany => "xbrl_calculation_company",
            CheckKind::XbrlCalculationTaxonomy => "xbrl_calculation_taxonomy",
            CheckKind::BalanceSheetEquation => "balance_sheet_equation",
            CheckKind::IncomeStatementLinkage => "income_statement_linkage",
            CheckKind::CashFlowLinkage => "cash_flow_linkage",
            CheckKind::RetainedEarningsRollforward => "retained_earnings_rollforward",
            CheckKind::CommonValuesConsistency => "common_values_consistency",
            CheckKind::ConceptValidity => "concept_validity",
            CheckKind::PeriodTypeMatch => "period_type_match",
            CheckKind::BalanceTypeMatch => "balance_type_match",
            CheckKind::DataTypeMatch => "data_type_match",
        }
    }

    pub fn category(self) -> CheckType {
        match self {
            CheckKind::CalculationConsistency
            | CheckKind::TotalReconciliation
            | CheckKind::SignConvention
            | CheckKind::DuplicateFacts => CheckType::Horizontal,
            CheckKind::XbrlCalculationCompany
            | CheckKind::XbrlCalculationTaxonomy
            | CheckKind::BalanceSheetEquation
            | CheckKind::IncomeStatementLinkage
            | CheckKind::CashFlowLinkage
            | CheckKind::RetainedEarningsRollforward
            | CheckKind::CommonValuesConsistency => CheckType::Vertical,
            CheckKind::ConceptValidity
            | CheckKind::PeriodTypeMatch
            | CheckKind::BalanceTypeMatch
            | CheckKind::DataTypeMatch => CheckType::Library,
        }
    }

    /// Aggregate kinds produce one result per context and are scored by pass rate.
    pub fn is_aggregate(self) -> bool {
        matches!(
            self,
            CheckKind::CalculationConsistency
                | CheckKind::XbrlCalculationCompany
                | CheckKind::XbrlCalculationTaxonomy
        )
    }

    /// Relative weight of the kind inside its category.
    pub fn default_weight(self) -> f64 {
        match self {
            CheckKind::CalculationConsistency => 0.50,
            CheckKind::TotalReconciliation => 0.30,
            CheckKind::SignConvention => 0.15,
            CheckKind::DuplicateFacts => 0.05,
            CheckKind::XbrlCalculationCompany => 0.40,
            CheckKind::XbrlCalculationTaxonomy => 0.30,
            CheckKind::BalanceSheetEquation => 0.10,
            CheckKind::IncomeStatementLinkage => 0.08,
            CheckKind::CashFlowLinkage => 0.05,
            CheckKind::RetainedEarningsRollforward => 0.02,
            CheckKind::CommonValuesConsistency => 0.05,
            CheckKind::ConceptValidity => 0.40,
            CheckKind::PeriodTypeMatch => 0.25,
            CheckKind::BalanceTypeMatch => 0.20,
            CheckKind::DataTypeMatch => 0.15,
        }
    }
}

/// Direction of a failed summation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MismatchDirection {
    /// Parent and children sum have opposite signs.
    SignMismatch,
    /// Children sum exceeds the reported parent.
    Overshoot,
    /// Children sum falls short of the reported parent.
    Undershoot,
}

/// How a calculation child's value was located.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChildSource {
    Exact,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChildContribution {
    pub concept: String,
    pub context_id: String,
    pub source: ChildSource,
    pub value: f64,
    pub corrected_value: f64,
    pub weight: f64,
    pub weighted: f64,
    pub decimals: Decimals,
    pub sign_corrected: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationDetails {
    pub role: String,
    pub role_name: String,
    pub parent_concept: String,
    pub context_id: String,
    pub depth: u32,
    pub parent_sign_corrected: bool,
    pub children: Vec<ChildContribution>,
    pub sign_corrections_applied: usize,
    pub comparison_decimals: Decimals,
    pub rounded_difference: f64,
    pub direction: Option<MismatchDirection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipDetails {
    pub role: String,
    pub parent_concept: String,
    pub context_id: String,
    pub reason: String,
    pub children_missing: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateItem {
    pub context_id: String,
    pub concept: String,
    pub original_concept: String,
    pub values: Vec<f64>,
    pub decimals: Vec<Decimals>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateDetails {
    /// Total number of affected duplicate sets.
    pub count: usize,
    /// Items listed below, capped for display.
    pub items: Vec<DuplicateItem>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatementValue {
    pub statement: String,
    pub value: f64,
    pub decimals: Decimals,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommonValueDetails {
    pub concept: String,
    pub context_id: String,
    pub period_key: String,
    pub values: Vec<StatementValue>,
}

/// Typed payload attached to a [`CheckResult`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckDetails {
    None,
    Calculation(CalculationDetails),
    Skipped(SkipDetails),
    Duplicates(DuplicateDetails),
    CommonValues(CommonValueDetails),
    Summary { evaluated: usize },
}

/// One verification outcome.
///
/// `passed = None` together with `skipped = true` means "not applicable".
/// Skips never count as failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckResult {
    #[serde(rename = "check_name")]
    pub kind: CheckKind,
    pub check_type: CheckType,
    pub passed: Option<bool>,
    pub skipped: bool,
    pub severity: Severity,
    pub message: String,
    pub expected_value: Option<f64>,
    pub actual_value: Option<f64>,
    pub difference: Option<f64>,
    pub details: CheckDetails,
}

impl CheckResult {
    fn base(kind: CheckKind, passed: Option<bool>, severity: Severity, message: String) -> Self {
        Self {
            kind,
            check_type: kind.category(),
            passed,
            skipped: false,
            severity,
            message,
            expected_value: None,
            actual_value: None,
            difference: None,
            details: CheckDetails::None,
        }
    }

    pub fn pass(kind: CheckKind, message: impl Into<String>) -> Self {
        Self::base(kind, Some(true), Severity::Info, message.into())
    }

    pub fn fail(kind: CheckKind, severity: Severity, message: impl Into<String>) -> Self {
        Self::base(kind, Some(false), severity, message.into())
    }

    pub fn skip(kind: CheckKind, message: impl Into<String>) -> Self {
        let mut result = Self::base(kind, None, Severity::Info, message.into());
        result.skipped = true;
        result
    }

    pub fn with_values(mut self, expected: f64, actual: f64, difference: f64) -> Self {
        self.expected_value = Some(expected);
        self.actual_value = Some(actual);
        self.difference = Some(difference);
        self
    }

    pub fn with_details(mut self, details: CheckDetails) -> Self {
        self.details = details;
        self
    }

    pub fn check_name(&self) -> &'static str {
        self.kind.name()
    }

    /// A real failure, i.e. evaluated and not passed.
    pub fn is_failure(&self) -> bool {
        !self.skipped && self.passed == Some(false)
    }
}
