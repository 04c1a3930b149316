//! Three-layer flow graph: ground truth → group → outcome.
//!
//! Node indices are stable: `GT+`, `GT-`, then groups in partition order,
//! then `TP`, `FP`, `TN`, `FN`. A name is only ever one node.

use std::collections::HashMap;

use serde::Serialize;

use crate::common::error::FairResult;
use crate::data::domain::EvaluationTable;

use super::disparity::{group_metrics, signed_pull};
use super::grouping::{resolve_groups, ProtectedRegistry};
use super::metrics::{
    false_negative_rate, false_positive_rate, true_negative_rate, true_positive_rate, Metric,
    MetricValue,
};

pub const GT_POSITIVE: &str = "GT+";
pub const GT_NEGATIVE: &str = "GT-";

/// Outcome cell a group→outcome link feeds, with the rate it carries.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum Outcome {
    #[serde(rename = "TP")]
    TruePositive,
    #[serde(rename = "FP")]
    FalsePositive,
    #[serde(rename = "TN")]
    TrueNegative,
    #[serde(rename = "FN")]
    FalseNegative,
}

impl Outcome {
    pub const ALL: [Outcome; 4] = [
        Outcome::TruePositive,
        Outcome::FalsePositive,
        Outcome::TrueNegative,
        Outcome::FalseNegative,
    ];

    pub fn node_name(&self) -> &'static str {
        match self {
            Outcome::TruePositive => "TP",
            Outcome::FalsePositive => "FP",
            Outcome::TrueNegative => "TN",
            Outcome::FalseNegative => "FN",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateKind {
    Tpr,
    Fpr,
    Tnr,
    Fnr,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FlowNode {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt_pos_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gt_neg_share: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric_val: Option<f64>,
    /// Population-weighted deviation from the mean group metric.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed_pull: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlowLink {
    pub source: usize,
    pub target: usize,
    pub value: u64,
    /// Fraction of the group's rows.
    pub share: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_kind: Option<RateKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<f64>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl FlowGraph {
    pub fn node_index(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name == name)
    }

    /// Links leaving the node at `source`.
    pub fn links_from(&self, source: usize) -> impl Iterator<Item = &FlowLink> {
        self.links.iter().filter(move |l| l.source == source)
    }
}

/// Insertion-ordered node registry keyed by name.
#[derive(Default)]
struct NodeIndex {
    nodes: Vec<FlowNode>,
    by_name: HashMap<String, usize>,
}

impl NodeIndex {
    fn id(&mut self, name: &str) -> usize {
        if let Some(&id) = self.by_name.get(name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(FlowNode {
            name: name.to_string(),
            ..FlowNode::default()
        });
        self.by_name.insert(name.to_string(), id);
        id
    }
}

fn share(count: u64, total: u64) -> f64 {
    count as f64 / total.max(1) as f64
}

/// Build the flow graph for the groups the selectors induce.
pub fn build_graph(
    table: &EvaluationTable,
    registry: &ProtectedRegistry,
    selectors: &[String],
    threshold: f64,
    metric: Metric,
) -> FairResult<FlowGraph> {
    let partition = resolve_groups(table, registry, selectors)?;
    let groups = group_metrics(table, &partition, threshold, metric);
    let pulls = signed_pull(&groups);

    let mut index = NodeIndex::default();
    let gt_pos = index.id(GT_POSITIVE);
    let gt_neg = index.id(GT_NEGATIVE);
    let group_ids: Vec<usize> = groups.iter().map(|g| index.id(&g.label)).collect();

    let mut links = Vec::with_capacity(groups.len() * 6);
    for ((group, &gid), pull) in groups.iter().zip(&group_ids).zip(&pulls) {
        let pos = group.counts.positives();
        let neg = group.counts.negatives();
        let total = pos + neg;

        let node = &mut index.nodes[gid];
        node.gt_pos_share = Some(share(pos, total));
        node.gt_neg_share = Some(share(neg, total));
        node.metric_val = group.value;
        node.signed_pull = *pull;

        links.push(FlowLink {
            source: gt_pos,
            target: gid,
            value: pos,
            share: share(pos, total),
            rate_kind: None,
            rate: None,
        });
        links.push(FlowLink {
            source: gt_neg,
            target: gid,
            value: neg,
            share: share(neg, total),
            rate_kind: None,
            rate: None,
        });
    }

    let outcome_ids: Vec<usize> = Outcome::ALL.iter().map(|o| index.id(o.node_name())).collect();

    for (group, &gid) in groups.iter().zip(&group_ids) {
        let c = &group.counts;
        let total = c.total();
        for (outcome, &target) in Outcome::ALL.iter().zip(&outcome_ids) {
            let (value, kind, rate): (u64, RateKind, MetricValue) = match outcome {
                Outcome::TruePositive => (c.tp, RateKind::Tpr, true_positive_rate(c)),
                Outcome::FalsePositive => (c.fp, RateKind::Fpr, false_positive_rate(c)),
                Outcome::TrueNegative => (c.tn, RateKind::Tnr, true_negative_rate(c)),
                Outcome::FalseNegative => (c.fn_, RateKind::Fnr, false_negative_rate(c)),
            };
            links.push(FlowLink {
                source: gid,
                target,
                value,
                share: share(value, total),
                rate_kind: Some(kind),
                rate,
            });
        }
    }

    tracing::debug!(
        module = "evaluation::flow",
        event = "graph_built",
        groups = groups.len(),
        nodes = index.nodes.len(),
        links = links.len()
    );

    Ok(FlowGraph {
        nodes: index.nodes,
        links,
    })
}
