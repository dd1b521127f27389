//! Report Module - Anomaly explanation
//!
//! Joins detector output, neighbour lists and population means into one
//! entry per anomaly, with feature-level deviation reasons.

pub mod types;
pub mod engine;
pub mod export;

#[cfg(test)]
mod tests;

pub use engine::{assemble, population_means, DeviationRule, DeviationRules};
pub use export::to_jsonl;
pub use types::{DeviationReason, ReportEntry};
