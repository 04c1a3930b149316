// lib.rs - fairness diagnostics core
pub mod common;
pub mod data;
pub mod scoring;
pub mod evaluation;
pub mod api;

pub use common::{FairError, FairResult};
pub use evaluation::{EvaluationContext, FairnessQuery, Metric};
