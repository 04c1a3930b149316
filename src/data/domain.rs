//! Core dataset definitions: feature values, evaluation rows and the immutable table.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::error::{FairError, FairResult};
use crate::common::ids::Fingerprint;

/// A single feature cell: numeric or categorical.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    /// Integral floats print without a fractional part (`30`, not `30.0`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Number(v) if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 => {
                write!(f, "{}", *v as i64)
            }
            FeatureValue::Number(v) => write!(f, "{v}"),
            FeatureValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for FeatureValue {
    fn from(value: f64) -> Self {
        FeatureValue::Number(value)
    }
}

impl From<&str> for FeatureValue {
    fn from(value: &str) -> Self {
        FeatureValue::Text(value.to_string())
    }
}

/// Feature name → value for one row, shaped like the original feature schema.
pub type FeatureRow = BTreeMap<String, FeatureValue>;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column set of the evaluation table.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn is_numeric(&self, name: &str) -> bool {
        matches!(self.column(name), Some(c) if c.kind == ColumnKind::Numeric)
    }
}

/// One held-out sample with its ground truth and predicted probability.
#[derive(Clone, Debug, PartialEq)]
pub struct EvaluationRow {
    features: FeatureRow,
    label: u8,
    score: f64,
}

impl EvaluationRow {
    pub fn features(&self) -> &FeatureRow {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }

    /// Ground truth, always 0 or 1.
    pub fn label(&self) -> u8 {
        self.label
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    /// Thresholded prediction; the boundary is inclusive.
    pub fn predicted(&self, threshold: f64) -> u8 {
        u8::from(self.score >= threshold)
    }
}

/// The fixed evaluation table. Built once, never mutated.
#[derive(Clone, Debug)]
pub struct EvaluationTable {
    schema: Schema,
    rows: Vec<EvaluationRow>,
    fingerprint: String,
}

impl EvaluationTable {
    /// Assemble the table from the scored-dataset collaborator's aligned vectors.
    ///
    /// Every row must carry exactly the listed columns. A column is numeric when
    /// every row holds a number for it.
    pub fn from_scored(
        columns: Vec<String>,
        features: Vec<FeatureRow>,
        labels: Vec<u8>,
        scores: Vec<f64>,
    ) -> FairResult<Self> {
        if features.len() != labels.len() || features.len() != scores.len() {
            return Err(FairError::invalid(format!(
                "misaligned scored dataset: {} feature rows, {} labels, {} scores",
                features.len(),
                labels.len(),
                scores.len()
            )));
        }
        for (idx, name) in columns.iter().enumerate() {
            if columns[..idx].contains(name) {
                return Err(FairError::invalid(format!("duplicate column '{name}'")));
            }
        }

        let mut rows = Vec::with_capacity(features.len());
        for (idx, ((features, label), score)) in features.into_iter().zip(labels).zip(scores).enumerate() {
            if label > 1 {
                return Err(FairError::invalid(format!("row {idx}: label {label} is not 0 or 1")));
            }
            if !score.is_finite() || !(0.0..=1.0).contains(&score) {
                return Err(FairError::invalid(format!("row {idx}: score {score} outside [0, 1]")));
            }
            if let Some(column) = columns.iter().find(|c| !features.contains_key(c.as_str())) {
                return Err(FairError::MissingFeature {
                    row: idx,
                    column: column.clone(),
                });
            }
            if let Some(extra) = features.keys().find(|k| !columns.contains(*k)) {
                return Err(FairError::invalid(format!("row {idx}: unexpected column '{extra}'")));
            }
            rows.push(EvaluationRow { features, label, score });
        }

        let schema = Schema::new(
            columns
                .into_iter()
                .map(|name| {
                    let numeric = rows
                        .iter()
                        .all(|r| matches!(r.features.get(&name), Some(FeatureValue::Number(_))));
                    let kind = if numeric && !rows.is_empty() {
                        ColumnKind::Numeric
                    } else {
                        ColumnKind::Categorical
                    };
                    Column { name, kind }
                })
                .collect(),
        );

        let fingerprint = fingerprint_rows(&schema, &rows);
        Ok(Self {
            schema,
            rows,
            fingerprint,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn rows(&self) -> &[EvaluationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Hex fingerprint over every value, label and score.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Numeric values of a column in row order. `None` for categorical or unknown columns.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<f64>> {
        if !self.schema.is_numeric(name) {
            return None;
        }
        self.rows
            .iter()
            .map(|r| r.feature(name).and_then(FeatureValue::as_number))
            .collect()
    }
}

fn fingerprint_rows(schema: &Schema, rows: &[EvaluationRow]) -> String {
    let mut hasher = Fingerprint::new();
    for column in schema.columns() {
        hasher.update(column.name.as_bytes());
        hasher.update(&[0]);
    }
    for row in rows {
        for column in schema.columns() {
            match row.feature(&column.name) {
                Some(FeatureValue::Number(v)) => hasher.update_f64(*v),
                Some(FeatureValue::Text(s)) => {
                    hasher.update(s.as_bytes());
                    hasher.update(&[0]);
                }
                None => hasher.update(&[0xff]),
            }
        }
        hasher.update(&[row.label]);
        hasher.update_f64(row.score);
    }
    hasher.finish_hex()
}

/// Source of the scored evaluation table, loaded once at startup.
pub trait ScoredDatasetSource {
    fn load(&self) -> FairResult<EvaluationTable>;
}
