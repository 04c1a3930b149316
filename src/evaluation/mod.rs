//! Fairness evaluation: grouping, confusion counts, metrics and the views built on them.
//!
//! Every query runs the same two passes: counts per group (or group × bin),
//! then derived rates, then cross-group disparity.

pub mod confusion;
pub mod disparity;
pub mod domain;
pub mod flow;
pub mod grouping;
pub mod heatmap;
pub mod metrics;
pub mod service;

#[cfg(test)]
mod property_tests;

pub use confusion::ConfusionCounts;
pub use domain::{DisparityReport, FairnessQuery, HeatmapSpec};
pub use flow::FlowGraph;
pub use heatmap::HeatmapMatrix;
pub use metrics::{Metric, MetricValue, RateComponent};
pub use service::EvaluationContext;
