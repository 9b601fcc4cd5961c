// Verification engine for XBRL filings.
// Takes statement-mapped facts and the filer's calculation networks and
// produces per-context check results, category scores and a quality level.

// --- Module Declarations ---
pub mod analysis;
pub mod config;
pub mod error;
pub mod facts;
pub mod network;
pub mod pipeline;
pub mod scoring;
pub mod sign;
pub mod store;
pub mod validation;

// --- Public Surface ---
pub use config::{ConfigError, VerificationConfig};
pub use error::VerifyError;
pub use pipeline::{load_networks, load_statements, FilingInput, FilingReport, RunDiagnostics, Verifier};
pub use scoring::{QualityClassification, QualityLevel, VerificationScores};
pub use store::{CalculationArc, CalculationNetwork, Decimals, Fact, MappedStatements, Unit};
pub use validation::{CheckKind, CheckResult, CheckType, Severity};
