//! Group × feature-bin heatmap of a fairness metric.
//!
//! Numeric features are cut at deduplicated quantile edges (right-closed bins,
//! the lowest one also closed on the left); categorical features get one bin
//! per distinct value in first-seen order.

use serde::Serialize;

use crate::common::error::{FairError, FairResult};
use crate::data::domain::{EvaluationTable, FeatureValue};

use super::confusion::ConfusionCounts;
use super::grouping::{resolve_groups, ProtectedRegistry};
use super::metrics::{cell_value, Metric, MetricValue, RateComponent};

/// Upper bound on requested quantile bins.
pub const MAX_HEATMAP_BINS: usize = 1_000;

/// Metric matrix: one row per feature bin, one column per group.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct HeatmapMatrix {
    pub rows: Vec<String>,
    pub cols: Vec<String>,
    pub values: Vec<Vec<MetricValue>>,
}

impl HeatmapMatrix {
    /// `(bins, groups)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }

    /// Lookup by label. Truncated edge labels can repeat; the first matching bin wins.
    pub fn cell(&self, row: &str, col: &str) -> Option<MetricValue> {
        let r = self.rows.iter().position(|l| l == row)?;
        let c = self.cols.iter().position(|l| l == col)?;
        self.cell_at(r, c)
    }

    /// Lookup by `(bin, group)` position.
    pub fn cell_at(&self, bin: usize, group: usize) -> Option<MetricValue> {
        self.values.get(bin)?.get(group).copied()
    }
}

/// Linear-interpolated quantile edges at `0, 1/bins, …, 1`, identical edges collapsed.
///
/// `bins` is clamped to [`MAX_HEATMAP_BINS`].
pub fn quantile_edges(values: &[f64], bins: usize) -> Vec<f64> {
    let bins = bins.min(MAX_HEATMAP_BINS);
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() || bins == 0 {
        return Vec::new();
    }
    sorted.sort_by(f64::total_cmp);

    let last = (sorted.len() - 1) as f64;
    let mut edges: Vec<f64> = (0..=bins)
        .map(|i| {
            let pos = last * i as f64 / bins as f64;
            let lo = pos.floor() as usize;
            let hi = pos.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
        })
        .collect();
    edges.dedup_by(|a, b| *a == *b);
    edges
}

/// Bin layout of the heatmap feature.
#[derive(Clone, Debug, PartialEq)]
pub enum FeatureBins {
    Numeric { edges: Vec<f64>, labels: Vec<String> },
    Categorical { labels: Vec<String> },
}

impl FeatureBins {
    /// Quantile bins over numeric values. All-identical values collapse to one bin.
    pub fn numeric(values: &[f64], bins: usize) -> Self {
        let edges = quantile_edges(values, bins);
        let labels = match edges.as_slice() {
            [] => Vec::new(),
            [only] => vec![format!("{}–{}", *only as i64, *only as i64)],
            _ => edges
                .windows(2)
                .map(|w| format!("{}–{}", w[0] as i64, w[1] as i64))
                .collect(),
        };
        FeatureBins::Numeric { edges, labels }
    }

    pub fn categorical<'a>(values: impl IntoIterator<Item = &'a FeatureValue>) -> Self {
        let mut labels: Vec<String> = Vec::new();
        for value in values {
            let label = value.to_string();
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        FeatureBins::Categorical { labels }
    }

    pub fn labels(&self) -> &[String] {
        match self {
            FeatureBins::Numeric { labels, .. } | FeatureBins::Categorical { labels } => labels,
        }
    }

    /// Bin position of a value, `None` when it falls outside every bin.
    pub fn assign(&self, value: &FeatureValue) -> Option<usize> {
        match (self, value) {
            (FeatureBins::Numeric { edges, .. }, FeatureValue::Number(v)) => numeric_bin(edges, *v),
            (FeatureBins::Numeric { .. }, FeatureValue::Text(_)) => None,
            (FeatureBins::Categorical { labels }, value) => {
                let label = value.to_string();
                labels.iter().position(|l| *l == label)
            }
        }
    }
}

fn numeric_bin(edges: &[f64], v: f64) -> Option<usize> {
    match edges {
        [] => None,
        [only] => (v == *only).then_some(0),
        [first, .., last] => {
            if v < *first || v > *last || v.is_nan() {
                return None;
            }
            if v == *first {
                return Some(0);
            }
            edges.windows(2).position(|w| v > w[0] && v <= w[1])
        }
    }
}

/// Cross-tabulate groups against bins of `feature` and evaluate the metric per cell.
///
/// A cell is missing when the group × bin intersection is empty or the metric's
/// denominator is zero. For equalized odds `component` picks TPR or FPR.
#[allow(clippy::too_many_arguments)]
pub fn build_heatmap(
    table: &EvaluationTable,
    registry: &ProtectedRegistry,
    feature: &str,
    selectors: &[String],
    threshold: f64,
    metric: Metric,
    bin_count: usize,
    component: RateComponent,
) -> FairResult<HeatmapMatrix> {
    if !table.schema().contains(feature) {
        return Err(FairError::UnknownFeature(feature.to_string()));
    }
    if bin_count == 0 || bin_count > MAX_HEATMAP_BINS {
        return Err(FairError::invalid(format!(
            "bin count must be between 1 and {MAX_HEATMAP_BINS}, got {bin_count}"
        )));
    }

    let bins = match table.numeric_column(feature) {
        Some(values) => FeatureBins::numeric(&values, bin_count),
        None => FeatureBins::categorical(table.rows().iter().filter_map(|r| r.feature(feature))),
    };
    let partition = resolve_groups(table, registry, selectors)?;

    let n_bins = bins.labels().len();
    let n_groups = partition.len();
    let mut cells = vec![vec![ConfusionCounts::default(); n_groups]; n_bins];
    for (idx, row) in table.rows().iter().enumerate() {
        let Some(bin) = row.feature(feature).and_then(|v| bins.assign(v)) else {
            continue;
        };
        let Some(group) = partition.group_of(idx) else {
            continue;
        };
        cells[bin][group].record(row.label(), row.predicted(threshold));
    }

    let values = cells
        .iter()
        .map(|row| {
            row.iter()
                .map(|counts| {
                    if counts.total() == 0 {
                        None
                    } else {
                        cell_value(counts, metric, component)
                    }
                })
                .collect()
        })
        .collect();

    tracing::debug!(
        module = "evaluation::heatmap",
        event = "heatmap_built",
        feature,
        bins = n_bins,
        groups = n_groups
    );

    Ok(HeatmapMatrix {
        rows: bins.labels().to_vec(),
        cols: partition.labels().to_vec(),
        values,
    })
}
