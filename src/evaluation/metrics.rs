//! Fairness metric library: confusion counts → named rates.
//!
//! A zero denominator yields an undefined value (`None`), never 0 or NaN.
//!
//! | metric | formula | undefined when |
//! |---|---|---|
//! | demographic parity | (TP+FP)/total | subset empty |
//! | equal opportunity | TP/(TP+FN) | TP+FN = 0 |
//! | predictive parity | TP/(TP+FP) | TP+FP = 0 |
//! | predictive equality | FP/(FP+TN) | FP+TN = 0 |
//! | treatment equality | FN/FP | FP = 0 |
//! | equalized odds | \|TPR−FPR\| | either rate undefined |

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::common::error::FairError;

use super::confusion::ConfusionCounts;

/// A rate, or `None` when its denominator is zero.
pub type MetricValue = Option<f64>;

/// Supported fairness metrics.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Metric {
    DemographicParity,
    EqualOpportunity,
    PredictiveParity,
    PredictiveEquality,
    TreatmentEquality,
    EqualizedOdds,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::DemographicParity,
        Metric::EqualOpportunity,
        Metric::PredictiveParity,
        Metric::PredictiveEquality,
        Metric::TreatmentEquality,
        Metric::EqualizedOdds,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::DemographicParity => "demographic_parity",
            Metric::EqualOpportunity => "equal_opportunity",
            Metric::PredictiveParity => "predictive_parity",
            Metric::PredictiveEquality => "predictive_equality",
            Metric::TreatmentEquality => "treatment_equality",
            Metric::EqualizedOdds => "equalized_odds",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = FairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.as_str() == s.trim())
            .ok_or_else(|| FairError::UnknownMetric(s.to_string()))
    }
}

impl Serialize for Metric {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Which directional rate fills a heatmap cell for equalized odds.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum RateComponent {
    #[default]
    Tpr,
    Fpr,
}

impl FromStr for RateComponent {
    type Err = FairError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tpr" => Ok(RateComponent::Tpr),
            "fpr" => Ok(RateComponent::Fpr),
            _ => Err(FairError::UnknownComponent(s.to_string())),
        }
    }
}

fn ratio(num: u64, den: u64) -> MetricValue {
    (den > 0).then(|| num as f64 / den as f64)
}

pub fn true_positive_rate(c: &ConfusionCounts) -> MetricValue {
    ratio(c.tp, c.tp + c.fn_)
}

pub fn false_positive_rate(c: &ConfusionCounts) -> MetricValue {
    ratio(c.fp, c.fp + c.tn)
}

pub fn true_negative_rate(c: &ConfusionCounts) -> MetricValue {
    ratio(c.tn, c.tn + c.fp)
}

pub fn false_negative_rate(c: &ConfusionCounts) -> MetricValue {
    ratio(c.fn_, c.fn_ + c.tp)
}

/// Value of `metric` for the given counts.
pub fn metric_value(counts: &ConfusionCounts, metric: Metric) -> MetricValue {
    match metric {
        Metric::DemographicParity => ratio(counts.predicted_positives(), counts.total()),
        Metric::EqualOpportunity => true_positive_rate(counts),
        Metric::PredictiveParity => ratio(counts.tp, counts.predicted_positives()),
        Metric::PredictiveEquality => false_positive_rate(counts),
        Metric::TreatmentEquality => ratio(counts.fn_, counts.fp),
        Metric::EqualizedOdds => {
            let tpr = true_positive_rate(counts)?;
            let fpr = false_positive_rate(counts)?;
            Some((tpr - fpr).abs())
        }
    }
}

/// Lenient lookup by name: an unsupported name is undefined rather than an error.
///
/// Request handling goes through [`Metric::from_str`] instead, which fails fast.
pub fn metric_value_by_name(counts: &ConfusionCounts, name: &str) -> MetricValue {
    name.parse::<Metric>()
        .ok()
        .and_then(|metric| metric_value(counts, metric))
}

/// Orientable per-cell value: equalized odds reports the chosen rate instead of the gap.
pub fn cell_value(counts: &ConfusionCounts, metric: Metric, component: RateComponent) -> MetricValue {
    match (metric, component) {
        (Metric::EqualizedOdds, RateComponent::Tpr) => true_positive_rate(counts),
        (Metric::EqualizedOdds, RateComponent::Fpr) => false_positive_rate(counts),
        (other, _) => metric_value(counts, other),
    }
}
