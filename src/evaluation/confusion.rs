//! Confusion aggregation over a row subset at a fixed threshold.

use serde::Serialize;

use crate::data::domain::EvaluationRow;

/// TP/FP/TN/FN for a row subset. The four counts always sum to the subset size.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct ConfusionCounts {
    #[serde(rename = "TP")]
    pub tp: u64,
    #[serde(rename = "FP")]
    pub fp: u64,
    #[serde(rename = "TN")]
    pub tn: u64,
    #[serde(rename = "FN")]
    pub fn_: u64,
}

impl ConfusionCounts {
    /// Tally one `(label, prediction)` pair.
    pub fn record(&mut self, label: u8, predicted: u8) {
        match (label, predicted) {
            (1, 1) => self.tp += 1,
            (0, 1) => self.fp += 1,
            (0, _) => self.tn += 1,
            _ => self.fn_ += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.tp + self.fp + self.tn + self.fn_
    }

    /// Rows with positive ground truth.
    pub fn positives(&self) -> u64 {
        self.tp + self.fn_
    }

    /// Rows with negative ground truth.
    pub fn negatives(&self) -> u64 {
        self.fp + self.tn
    }

    pub fn predicted_positives(&self) -> u64 {
        self.tp + self.fp
    }
}

/// Count outcomes for the rows at `indices`. An empty subset yields all zeros.
pub fn confusion(rows: &[EvaluationRow], indices: &[usize], threshold: f64) -> ConfusionCounts {
    let mut counts = ConfusionCounts::default();
    for row in indices.iter().filter_map(|&i| rows.get(i)) {
        counts.record(row.label(), row.predicted(threshold));
    }
    counts
}

/// Count outcomes over every row.
pub fn confusion_all(rows: &[EvaluationRow], threshold: f64) -> ConfusionCounts {
    let mut counts = ConfusionCounts::default();
    for row in rows {
        counts.record(row.label(), row.predicted(threshold));
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::domain::{EvaluationTable, FeatureRow};

    fn table(pairs: &[(u8, f64)]) -> EvaluationTable {
        let features = pairs
            .iter()
            .map(|_| {
                let mut r = FeatureRow::new();
                r.insert("x".into(), 1.0.into());
                r
            })
            .collect();
        EvaluationTable::from_scored(
            vec!["x".into()],
            features,
            pairs.iter().map(|p| p.0).collect(),
            pairs.iter().map(|p| p.1).collect(),
        )
        .unwrap()
    }

    #[test]
    fn four_row_example() {
        let t = table(&[(1, 0.9), (1, 0.4), (0, 0.6), (0, 0.1)]);
        let counts = confusion_all(t.rows(), 0.5);
        assert_eq!(
            counts,
            ConfusionCounts {
                tp: 1,
                fp: 1,
                tn: 1,
                fn_: 1
            }
        );
    }

    #[test]
    fn empty_subset_is_all_zero() {
        let t = table(&[(1, 0.9)]);
        assert_eq!(confusion(t.rows(), &[], 0.5), ConfusionCounts::default());
    }

    #[test]
    fn threshold_is_inclusive() {
        let t = table(&[(1, 0.5), (0, 0.5)]);
        let counts = confusion(t.rows(), &[0, 1], 0.5);
        assert_eq!((counts.tp, counts.fp), (1, 1));
        let counts = confusion(t.rows(), &[0, 1], 0.51);
        assert_eq!((counts.fn_, counts.tn), (1, 1));
    }

    #[test]
    fn subset_only_counts_listed_rows() {
        let t = table(&[(1, 0.9), (1, 0.4), (0, 0.6), (0, 0.1)]);
        let counts = confusion(t.rows(), &[0, 3], 0.5);
        assert_eq!(counts.total(), 2);
        assert_eq!((counts.tp, counts.tn), (1, 1));
    }
}
