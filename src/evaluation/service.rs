//! The evaluation context: the immutable table plus everything a query needs.
//!
//! Built once at startup and shared by reference. Every query recomputes from
//! the full table; nothing is cached between calls.
//! TODO: Memoise group partitions per selector list if heatmap latency becomes a problem.

use std::sync::Arc;
use std::time::Instant;

use crate::common::config::AppCfg;
use crate::common::error::FairResult;
use crate::common::time;
use crate::data::domain::{EvaluationTable, FeatureRow, ScoredDatasetSource};
use crate::data::service::{self as data_service, RowExport};
use crate::scoring::domain::Rescorer;
use crate::scoring::service as scoring_service;

use super::disparity::{self, gap_of, group_metrics, signed_pull};
use super::domain::{DisparityReport, FairnessQuery, GroupDisparity, HeatmapSpec};
use super::flow::{self, FlowGraph};
use super::grouping::{resolve_groups, ProtectedRegistry};
use super::heatmap::{self, HeatmapMatrix};

pub struct EvaluationContext {
    table: EvaluationTable,
    registry: ProtectedRegistry,
    scorer: Arc<dyn Rescorer>,
    cfg: AppCfg,
}

impl EvaluationContext {
    pub fn new(
        table: EvaluationTable,
        registry: ProtectedRegistry,
        scorer: Arc<dyn Rescorer>,
        cfg: AppCfg,
    ) -> Self {
        tracing::info!(
            module = "evaluation::service",
            event = "context_ready",
            rows = table.len(),
            fingerprint = table.fingerprint(),
            selectors = ?registry.selectors().collect::<Vec<_>>()
        );
        Self {
            table,
            registry,
            scorer,
            cfg,
        }
    }

    /// Load the table from `source` and take the registry from configuration.
    pub fn load(
        cfg: AppCfg,
        source: &dyn ScoredDatasetSource,
        scorer: Arc<dyn Rescorer>,
    ) -> FairResult<Self> {
        let table = source.load()?;
        let registry = cfg.registry();
        Ok(Self::new(table, registry, scorer, cfg))
    }

    pub fn table(&self) -> &EvaluationTable {
        &self.table
    }

    pub fn registry(&self) -> &ProtectedRegistry {
        &self.registry
    }

    pub fn cfg(&self) -> &AppCfg {
        &self.cfg
    }

    /// Max − min disparity of the metric across groups.
    pub fn gap(&self, query: &FairnessQuery) -> FairResult<f64> {
        let start = Instant::now();
        let gap = disparity::gap(
            &self.table,
            &self.registry,
            &query.selectors,
            query.threshold,
            query.metric,
        )?;
        tracing::info!(
            module = "evaluation::service",
            event = "gap",
            metric = %query.metric,
            threshold = query.threshold,
            selectors = ?query.selectors,
            gap,
            dur_ms = time::elapsed_ms(start)
        );
        Ok(gap)
    }

    /// Per-group values and signed pulls behind the gap.
    pub fn disparity_report(&self, query: &FairnessQuery) -> FairResult<DisparityReport> {
        let partition = resolve_groups(&self.table, &self.registry, &query.selectors)?;
        let groups = group_metrics(&self.table, &partition, query.threshold, query.metric);
        let pulls = signed_pull(&groups);
        let gap = if query.selectors.is_empty() {
            0.0
        } else {
            gap_of(groups.iter().map(|g| g.value))
        };
        Ok(DisparityReport {
            metric: query.metric,
            gap,
            groups: groups
                .into_iter()
                .zip(pulls)
                .map(|(metric, signed_pull)| GroupDisparity { metric, signed_pull })
                .collect(),
        })
    }

    pub fn graph(&self, query: &FairnessQuery) -> FairResult<FlowGraph> {
        let start = Instant::now();
        let graph = flow::build_graph(
            &self.table,
            &self.registry,
            &query.selectors,
            query.threshold,
            query.metric,
        )?;
        tracing::info!(
            module = "evaluation::service",
            event = "graph",
            metric = %query.metric,
            threshold = query.threshold,
            selectors = ?query.selectors,
            nodes = graph.nodes.len(),
            dur_ms = time::elapsed_ms(start)
        );
        Ok(graph)
    }

    pub fn heatmap(&self, query: &FairnessQuery, spec: &HeatmapSpec) -> FairResult<HeatmapMatrix> {
        let start = Instant::now();
        let matrix = heatmap::build_heatmap(
            &self.table,
            &self.registry,
            &spec.feature,
            &query.selectors,
            query.threshold,
            query.metric,
            spec.bins,
            spec.component,
        )?;
        tracing::info!(
            module = "evaluation::service",
            event = "heatmap",
            metric = %query.metric,
            feature = %spec.feature,
            threshold = query.threshold,
            selectors = ?query.selectors,
            shape = ?matrix.shape(),
            dur_ms = time::elapsed_ms(start)
        );
        Ok(matrix)
    }

    /// Score edited rows; the evaluation table is left untouched.
    pub fn rescore(&self, rows: &[FeatureRow]) -> FairResult<Vec<f64>> {
        scoring_service::rescore(self.table.schema(), self.scorer.as_ref(), rows)
    }

    pub fn feature_list(&self) -> Vec<String> {
        data_service::feature_list(&self.table)
    }

    pub fn export_rows(&self, threshold: f64) -> RowExport {
        data_service::export_rows(&self.table, threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::metrics::Metric;
    use crate::scoring::domain::LogisticScorer;

    fn context() -> EvaluationContext {
        let rows = [
            (25.0, "male", 1u8, 0.9),
            (52.0, "female", 1, 0.3),
            (33.0, "female", 0, 0.7),
            (41.0, "male", 0, 0.2),
        ];
        let features = rows
            .iter()
            .map(|(age, gender, _, _)| {
                let mut r = FeatureRow::new();
                r.insert("Age".into(), (*age).into());
                r.insert("Gender".into(), (*gender).into());
                r
            })
            .collect();
        let table = EvaluationTable::from_scored(
            vec!["Age".into(), "Gender".into()],
            features,
            rows.iter().map(|r| r.2).collect(),
            rows.iter().map(|r| r.3).collect(),
        )
        .unwrap();
        EvaluationContext::new(
            table,
            ProtectedRegistry::default(),
            Arc::new(LogisticScorer::new(0.0)),
            AppCfg::default(),
        )
    }

    #[test]
    fn report_agrees_with_gap() {
        let ctx = context();
        let query = FairnessQuery::new(&["gender"], 0.5, Metric::EqualOpportunity);
        let report = ctx.disparity_report(&query).unwrap();
        assert_eq!(report.gap, ctx.gap(&query).unwrap());
        assert_eq!(report.gap, 1.0);
        assert_eq!(report.groups.len(), 2);
        assert_eq!(report.groups[0].metric.label, "Male");
    }

    #[test]
    fn graph_metric_values_match_report() {
        let ctx = context();
        let query = FairnessQuery::new(&["gender"], 0.5, Metric::PredictiveEquality);
        let report = ctx.disparity_report(&query).unwrap();
        let graph = ctx.graph(&query).unwrap();
        for group in &report.groups {
            let node = &graph.nodes[graph.node_index(&group.metric.label).unwrap()];
            assert_eq!(node.metric_val, group.metric.value);
            assert_eq!(node.signed_pull, group.signed_pull);
        }
    }

    #[test]
    fn rescore_leaves_table_untouched() {
        let ctx = context();
        let before = ctx.table().fingerprint().to_string();
        let edited: Vec<FeatureRow> = ctx.table().rows().iter().map(|r| r.features().clone()).collect();
        let scores = ctx.rescore(&edited).unwrap();
        assert_eq!(scores, vec![0.5; 4]);
        assert_eq!(ctx.table().fingerprint(), before);
    }
}
