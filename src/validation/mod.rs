//! Verification checks and their structured results.
//!
//! The `HorizontalChecker` evaluates the filer's own calculation arcs per
//! context; the `VerticalChecker` compares values that several statements
//! report. Both only ever produce `CheckResult`s, never errors.
pub use self::binding::{BindingChecker, BindingResult, BindingStatus, UnboundReason};
pub use self::horizontal::{HorizontalChecker, HorizontalOutcome, HorizontalSummary};
pub use self::result::{CheckDetails, CheckKind, CheckResult, CheckType, Severity};
pub use self::vertical::VerticalChecker;

// --- MODULE DECLARATIONS ---
pub mod binding;
pub mod horizontal;
pub mod result;
pub mod vertical;
mod rules {
    pub mod calculation;
    pub mod common_values;
    pub mod duplicates;
}
