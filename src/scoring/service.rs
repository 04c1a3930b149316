//! Pass-through to the re-scorer for edited rows.
//!
//! Stateless per call: rows in, scores out, nothing written back to the table.

use std::time::Instant;

use crate::common::error::{FairError, FairResult};
use crate::common::time;
use crate::data::domain::{FeatureRow, Schema};

use super::domain::Rescorer;

/// Keep only the schema's columns; a missing one is an error, extras are dropped.
pub fn project_rows(schema: &Schema, rows: &[FeatureRow]) -> FairResult<Vec<FeatureRow>> {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            schema
                .columns()
                .iter()
                .map(|column| match row.get(&column.name) {
                    Some(value) => Ok((column.name.clone(), value.clone())),
                    None => Err(FairError::MissingFeature {
                        row: idx,
                        column: column.name.clone(),
                    }),
                })
                .collect::<FairResult<FeatureRow>>()
        })
        .collect()
}

/// Score edited feature rows with the re-scorer.
pub fn rescore(schema: &Schema, scorer: &dyn Rescorer, rows: &[FeatureRow]) -> FairResult<Vec<f64>> {
    if rows.is_empty() {
        return Err(FairError::invalid("no rows provided"));
    }
    let start = Instant::now();
    let projected = project_rows(schema, rows)?;
    let scores = scorer.score(&projected)?;

    if scores.len() != rows.len() {
        return Err(FairError::Scoring(format!(
            "scorer returned {} scores for {} rows",
            scores.len(),
            rows.len()
        )));
    }
    if let Some(bad) = scores.iter().find(|s| !s.is_finite() || !(0.0..=1.0).contains(*s)) {
        return Err(FairError::Scoring(format!("probability {bad} outside [0, 1]")));
    }

    tracing::info!(
        module = "scoring::service",
        event = "rescore",
        rows = rows.len(),
        dur_ms = time::elapsed_ms(start)
    );
    Ok(scores)
}
