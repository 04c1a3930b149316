//! Filesystem-backed scored dataset: a JSON snapshot written by the training side.
//!
//! ```json
//! { "columns": ["Age", "Gender"],
//!   "rows": [ { "features": {"Age": 31, "Gender": "male"}, "label": 1, "score": 0.72 } ] }
//! ```
//!
//! `columns` is optional; without it the first row's keys are used, sorted.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::config::AppCfg;
use crate::common::error::FairResult;

use super::domain::{EvaluationTable, FeatureRow, ScoredDatasetSource};

#[derive(Debug, Deserialize)]
struct Snapshot {
    #[serde(default)]
    columns: Option<Vec<String>>,
    rows: Vec<SnapshotRow>,
}

#[derive(Debug, Deserialize)]
struct SnapshotRow {
    features: FeatureRow,
    label: u8,
    score: f64,
}

/// Snapshot file rooted at `cfg.data_root`.
pub struct FsScoredDataset {
    path: PathBuf,
}

impl FsScoredDataset {
    pub fn new(cfg: &AppCfg) -> Self {
        Self {
            path: PathBuf::from(&cfg.data_root).join(&cfg.dataset_file),
        }
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ScoredDatasetSource for FsScoredDataset {
    fn load(&self) -> FairResult<EvaluationTable> {
        let raw = fs::read_to_string(&self.path)?;
        let snapshot: Snapshot = serde_json::from_str(&raw)?;

        let columns = match snapshot.columns {
            Some(columns) => columns,
            None => snapshot
                .rows
                .first()
                .map(|r| r.features.keys().cloned().collect())
                .unwrap_or_default(),
        };

        let mut features = Vec::with_capacity(snapshot.rows.len());
        let mut labels = Vec::with_capacity(snapshot.rows.len());
        let mut scores = Vec::with_capacity(snapshot.rows.len());
        for row in snapshot.rows {
            features.push(row.features);
            labels.push(row.label);
            scores.push(row.score);
        }

        let table = EvaluationTable::from_scored(columns, features, labels, scores)?;
        tracing::info!(
            module = "data::repo_fs",
            event = "dataset_loaded",
            path = %self.path.display(),
            rows = table.len(),
            columns = table.schema().columns().len(),
            fingerprint = table.fingerprint()
        );
        Ok(table)
    }
}
