//! Data domain: the scored evaluation table and read-only views over it.

pub mod domain;
pub mod repo_fs;
pub mod service;

pub use domain::{EvaluationRow, EvaluationTable, FeatureRow, FeatureValue, Schema};
