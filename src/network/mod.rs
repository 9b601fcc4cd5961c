//! Calculation networks: role scoping over a per-role concept arena.
pub mod arena;
pub mod scoping;
pub mod topology;

pub use arena::{ConceptArena, ConceptId};
pub use scoping::{role_name, ChildArc, RoleScopedCalculations, ScopedCalculation, ScopingDiagnostics};
pub use topology::Topology;
