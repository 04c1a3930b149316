//! Query parameters and report shapes shared by the evaluation services.

use serde::Serialize;

use super::disparity::GroupMetric;
use super::metrics::{Metric, RateComponent};

/// Which groups to compare, at which threshold, on which metric.
#[derive(Clone, Debug, PartialEq)]
pub struct FairnessQuery {
    /// Zero, one or two protected-attribute selectors, order significant.
    pub selectors: Vec<String>,
    pub threshold: f64,
    pub metric: Metric,
}

impl FairnessQuery {
    pub fn new(selectors: &[&str], threshold: f64, metric: Metric) -> Self {
        Self {
            selectors: selectors.iter().map(|s| s.to_string()).collect(),
            threshold,
            metric,
        }
    }
}

/// Heatmap axis settings on top of a [`FairnessQuery`].
#[derive(Clone, Debug, PartialEq)]
pub struct HeatmapSpec {
    pub feature: String,
    pub bins: usize,
    pub component: RateComponent,
}

/// Per-group breakdown behind a gap value.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisparityReport {
    pub metric: Metric,
    pub gap: f64,
    pub groups: Vec<GroupDisparity>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GroupDisparity {
    #[serde(flatten)]
    pub metric: GroupMetric,
    pub signed_pull: Option<f64>,
}
