//! The input data model: facts, precision, units and calculation arcs.
pub mod statements;
pub mod types;
pub mod values;

pub use statements::{ExtractionStats, MappedStatements, RawValue, Statement, StatementFact};
pub use types::{CalculationArc, CalculationNetwork, Decimals, Fact, Unit};
pub use values::{local_name, normalize_concept, normalize_name};
