//! Re-scoring contract and a logistic implementation of it.
//!
//! Training happens elsewhere; a scorer only maps feature rows to probabilities.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::common::error::{FairError, FairResult};
use crate::data::domain::{FeatureRow, FeatureValue};

/// Maps (possibly edited) feature rows to positive-class probabilities, one per row.
pub trait Rescorer: Send + Sync {
    fn score(&self, rows: &[FeatureRow]) -> FairResult<Vec<f64>>;
}

/// Logistic model over raw numeric features and one-hot encoded categoricals.
///
/// A category absent from `categorical` contributes nothing, so unseen values
/// are tolerated rather than rejected.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LogisticScorer {
    pub intercept: f64,
    #[serde(default)]
    pub numeric: BTreeMap<String, f64>,
    /// column → category → weight
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
}

impl LogisticScorer {
    pub fn new(intercept: f64) -> Self {
        Self {
            intercept,
            ..Self::default()
        }
    }

    pub fn with_numeric(mut self, column: &str, weight: f64) -> Self {
        self.numeric.insert(column.to_string(), weight);
        self
    }

    pub fn with_category(mut self, column: &str, category: &str, weight: f64) -> Self {
        self.categorical
            .entry(column.to_string())
            .or_default()
            .insert(category.to_string(), weight);
        self
    }

    fn logit(&self, row_idx: usize, row: &FeatureRow) -> FairResult<f64> {
        let mut z = self.intercept;
        for (column, weight) in &self.numeric {
            match row.get(column) {
                Some(FeatureValue::Number(v)) => z += weight * v,
                Some(FeatureValue::Text(raw)) => {
                    let v: f64 = raw.trim().parse().map_err(|_| {
                        FairError::Scoring(format!("row {row_idx}: '{column}' is not numeric ('{raw}')"))
                    })?;
                    z += weight * v;
                }
                None => {
                    return Err(FairError::MissingFeature {
                        row: row_idx,
                        column: column.clone(),
                    })
                }
            }
        }
        for (column, weights) in &self.categorical {
            if let Some(value) = row.get(column) {
                z += weights.get(&value.to_string()).copied().unwrap_or(0.0);
            }
        }
        Ok(z)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Rescorer for LogisticScorer {
    fn score(&self, rows: &[FeatureRow]) -> FairResult<Vec<f64>> {
        rows.iter()
            .enumerate()
            .map(|(idx, row)| self.logit(idx, row).map(sigmoid))
            .collect()
    }
}
