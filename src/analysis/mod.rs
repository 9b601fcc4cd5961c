//! Comparison primitives: precision, units, periods and contexts.
pub mod context;
pub mod period;
pub mod tolerance;
pub mod units;

pub use context::{is_dimensional, ContextMatcher};
pub use period::{PeriodExtractor, PeriodInfo, PeriodType};
pub use tolerance::{compare, values_equal, within_tolerance, ToleranceOutcome};
pub use units::{ParsedUnit, UnitError};
