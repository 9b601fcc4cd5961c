//! Fact grouping by context and duplicate classification.
pub mod duplicates;
pub mod groups;

pub use duplicates::{DuplicateInfo, DuplicateType, EqualityBasis, FactEntry};
pub use groups::{ConceptOccurrence, ContextGroup, FactGroups, FlaggedDuplicate, GroupSummary};
