//! Disparity engine: per-group metric values reduced to a max − min gap.
//!
//! TODO: Surface signed pull in the gap response once the dashboard renders it.

use serde::Serialize;

use crate::common::error::FairResult;
use crate::data::domain::EvaluationTable;

use super::confusion::{confusion, ConfusionCounts};
use super::grouping::{resolve_groups, GroupPartition, ProtectedRegistry};
use super::metrics::{metric_value, Metric, MetricValue};

/// Metric outcome for one group.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupMetric {
    pub label: String,
    pub rows: usize,
    pub counts: ConfusionCounts,
    pub value: MetricValue,
}

/// Counts then metric value for every group of the partition, in partition order.
pub fn group_metrics(
    table: &EvaluationTable,
    partition: &GroupPartition,
    threshold: f64,
    metric: Metric,
) -> Vec<GroupMetric> {
    partition
        .groups()
        .map(|(label, members)| {
            let counts = confusion(table.rows(), members, threshold);
            GroupMetric {
                label: label.to_string(),
                rows: members.len(),
                counts,
                value: metric_value(&counts, metric),
            }
        })
        .collect()
}

/// `max − min` over the defined values; 0.0 when fewer than two are defined.
pub fn gap_of(values: impl IntoIterator<Item = MetricValue>) -> f64 {
    let defined: Vec<f64> = values.into_iter().flatten().collect();
    if defined.len() < 2 {
        return 0.0;
    }
    let max = defined.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = defined.iter().copied().fold(f64::INFINITY, f64::min);
    max - min
}

/// Disparity of `metric` across the groups the selectors induce.
///
/// No selector means no groups to compare, so the gap is exactly 0.0.
pub fn gap(
    table: &EvaluationTable,
    registry: &ProtectedRegistry,
    selectors: &[String],
    threshold: f64,
    metric: Metric,
) -> FairResult<f64> {
    if selectors.is_empty() {
        return Ok(0.0);
    }
    let partition = resolve_groups(table, registry, selectors)?;
    let groups = group_metrics(table, &partition, threshold, metric);
    Ok(gap_of(groups.iter().map(|g| g.value)))
}

/// Population-weighted signed pull: `(value − mean of defined values) × rows`.
///
/// Groups with an undefined value get `None` and do not enter the mean.
pub fn signed_pull(groups: &[GroupMetric]) -> Vec<Option<f64>> {
    let defined: Vec<f64> = groups.iter().filter_map(|g| g.value).collect();
    if defined.is_empty() {
        return vec![None; groups.len()];
    }
    let mean = defined.iter().sum::<f64>() / defined.len() as f64;
    groups
        .iter()
        .map(|g| g.value.map(|v| (v - mean) * g.rows as f64))
        .collect()
}
