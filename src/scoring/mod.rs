//! Scoring domain: the re-scorer collaborator for edited feature rows.

pub mod domain;
pub mod service;

pub use domain::{LogisticScorer, Rescorer};
