//! Property tests for the aggregation invariants shared by gap, graph and heatmap.

use proptest::prelude::*;

use crate::data::domain::{EvaluationTable, FeatureRow};
use crate::evaluation::confusion::{confusion_all, ConfusionCounts};
use crate::evaluation::disparity::gap;
use crate::evaluation::flow::build_graph;
use crate::evaluation::grouping::{resolve_groups, ProtectedRegistry};
use crate::evaluation::heatmap::build_heatmap;
use crate::evaluation::metrics::{metric_value, Metric, RateComponent};

// ── Generators ─────────────────────────────────────────────────────────────

type RawRow = (u8, &'static str, &'static str, u8, f64);

fn arb_row() -> impl Strategy<Value = RawRow> {
    (
        18u8..80,
        prop_oneof![Just("male"), Just("female")],
        prop_oneof![Just("single"), Just("married"), Just("divorced/separated")],
        0u8..=1,
        0.0f64..=1.0,
    )
}

fn arb_metric() -> impl Strategy<Value = Metric> {
    proptest::sample::select(Metric::ALL.to_vec())
}

fn arb_counts() -> impl Strategy<Value = ConfusionCounts> {
    (0u64..5, 0u64..5, 0u64..5, 0u64..5).prop_map(|(tp, fp, tn, fn_)| ConfusionCounts { tp, fp, tn, fn_ })
}

fn build(rows: &[RawRow]) -> EvaluationTable {
    let features = rows
        .iter()
        .map(|(age, gender, marital, _, _)| {
            let mut r = FeatureRow::new();
            r.insert("Age".into(), f64::from(*age).into());
            r.insert("Gender".into(), (*gender).into());
            r.insert("Marital_status".into(), (*marital).into());
            r
        })
        .collect();
    EvaluationTable::from_scored(
        vec!["Age".into(), "Gender".into(), "Marital_status".into()],
        features,
        rows.iter().map(|r| r.3).collect(),
        rows.iter().map(|r| r.4).collect(),
    )
    .expect("generated rows are valid")
}

fn sel(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

proptest! {
    #[test]
    fn confusion_counts_cover_every_row(rows in proptest::collection::vec(arb_row(), 0..60), thr in 0.0f64..=1.0) {
        let table = build(&rows);
        prop_assert_eq!(confusion_all(table.rows(), thr).total(), rows.len() as u64);
    }

    #[test]
    fn zero_denominator_is_undefined(counts in arb_counts(), metric in arb_metric()) {
        let denominator_zero = match metric {
            Metric::DemographicParity => counts.total() == 0,
            Metric::EqualOpportunity => counts.tp + counts.fn_ == 0,
            Metric::PredictiveParity => counts.tp + counts.fp == 0,
            Metric::PredictiveEquality => counts.fp + counts.tn == 0,
            Metric::TreatmentEquality => counts.fp == 0,
            Metric::EqualizedOdds => counts.tp + counts.fn_ == 0 || counts.fp + counts.tn == 0,
        };
        let value = metric_value(&counts, metric);
        prop_assert_eq!(value.is_none(), denominator_zero);
        if let Some(v) = value {
            prop_assert!(v.is_finite() && v >= 0.0);
        }
    }

    #[test]
    fn empty_selection_gap_is_zero(rows in proptest::collection::vec(arb_row(), 0..40), thr in 0.0f64..=1.0, metric in arb_metric()) {
        let table = build(&rows);
        prop_assert_eq!(gap(&table, &ProtectedRegistry::default(), &[], thr, metric).unwrap(), 0.0);
    }

    #[test]
    fn swapping_two_selectors_keeps_the_gap(rows in proptest::collection::vec(arb_row(), 1..60), thr in 0.0f64..=1.0, metric in arb_metric()) {
        let table = build(&rows);
        let registry = ProtectedRegistry::default();
        let forward = gap(&table, &registry, &sel(&["gender", "age"]), thr, metric).unwrap();
        let backward = gap(&table, &registry, &sel(&["age", "gender"]), thr, metric).unwrap();
        prop_assert!((forward - backward).abs() < 1e-12);
        prop_assert!(forward >= 0.0);
    }

    #[test]
    fn graph_shape_and_link_sums(rows in proptest::collection::vec(arb_row(), 1..60), thr in 0.0f64..=1.0, metric in arb_metric()) {
        let table = build(&rows);
        let registry = ProtectedRegistry::default();
        let selectors = sel(&["gender", "marital_status"]);
        let partition = resolve_groups(&table, &registry, &selectors).unwrap();
        let graph = build_graph(&table, &registry, &selectors, thr, metric).unwrap();

        prop_assert_eq!(graph.nodes.len(), 2 + partition.len() + 4);
        for link in &graph.links {
            prop_assert!(link.value <= rows.len() as u64);
        }
        for (label, members) in partition.groups() {
            let id = graph.node_index(label).unwrap();
            let outgoing: u64 = graph.links_from(id).map(|l| l.value).sum();
            prop_assert_eq!(outgoing, members.len() as u64);
        }
    }

    #[test]
    fn heatmap_shape_matches_bins_and_groups(rows in proptest::collection::vec(arb_row(), 1..60), bins in 1usize..8, metric in arb_metric()) {
        let table = build(&rows);
        let registry = ProtectedRegistry::default();
        let selectors = sel(&["gender"]);
        let partition = resolve_groups(&table, &registry, &selectors).unwrap();
        let matrix = build_heatmap(&table, &registry, "Age", &selectors, 0.5, metric, bins, RateComponent::Tpr).unwrap();
        prop_assert!(matrix.rows.len() <= bins);
        prop_assert!(!matrix.rows.is_empty());
        prop_assert_eq!(matrix.cols.len(), partition.len());
        prop_assert_eq!(matrix.values.len(), matrix.rows.len());
        for row in &matrix.values {
            prop_assert_eq!(row.len(), partition.len());
        }
    }
}
