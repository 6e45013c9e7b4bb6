//! Pipeline stages
//!
//! Each stage is a plain function over a [`crate::registry::RunContext`]:
//! it resolves its inputs through the context, does its work and publishes
//! outputs or records metrics. The binaries in `src/bin` are thin wrappers
//! that parse flags, open the run and call the stage.

pub mod cleaning;
pub mod evaluation;

pub use cleaning::{CleaningOutcome, CleaningParams, FilterCounts, GeoBounds};
pub use evaluation::{EvaluationParams, EvaluationReport};
