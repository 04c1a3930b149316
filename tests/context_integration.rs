//! End-to-end checks: snapshot on disk → context → every query route.

use std::fs;
use std::sync::Arc;
use std::thread;

use fairsight::api::query::{ExportQuery, GroupQuery, HeatmapQuery, RescoreRequest};
use fairsight::api::{
    handle_disparity, handle_export, handle_feature_list, handle_gap, handle_graph,
    handle_heatmap, handle_rescore, ErrorBody,
};
use fairsight::common::config::AppCfg;
use fairsight::data::domain::ScoredDatasetSource;
use fairsight::data::repo_fs::FsScoredDataset;
use fairsight::scoring::LogisticScorer;
use fairsight::{EvaluationContext, FairError};

const SNAPSHOT: &str = r#"{
  "columns": ["Age", "Gender", "Marital_status", "Duration", "Purpose"],
  "rows": [
    {"features": {"Age": 22, "Gender": "male",   "Marital_status": "single",   "Duration": 6,  "Purpose": "car"}, "label": 1, "score": 0.91},
    {"features": {"Age": 35, "Gender": "female", "Marital_status": "married",  "Duration": 12, "Purpose": "tv"},  "label": 1, "score": 0.42},
    {"features": {"Age": 47, "Gender": "male",   "Marital_status": "married",  "Duration": 24, "Purpose": "car"}, "label": 0, "score": 0.63},
    {"features": {"Age": 29, "Gender": "female", "Marital_status": "single",   "Duration": 36, "Purpose": "tv"},  "label": 0, "score": 0.08},
    {"features": {"Age": 61, "Gender": "female", "Marital_status": "divorced", "Duration": 12, "Purpose": "education"}, "label": 1, "score": 0.77},
    {"features": {"Age": 30, "Gender": "male",   "Marital_status": "single",   "Duration": 48, "Purpose": "car"}, "label": 0, "score": 0.55}
  ]
}"#;

fn context() -> (tempfile::TempDir, EvaluationContext) {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(dir.path().join("scored.json"), SNAPSHOT).expect("write snapshot");
    let cfg = AppCfg {
        data_root: dir.path().display().to_string(),
        ..AppCfg::default()
    };
    let source = FsScoredDataset::new(&cfg);
    let scorer = LogisticScorer::new(-2.0)
        .with_numeric("Duration", 0.05)
        .with_category("Purpose", "car", 1.0);
    let ctx = EvaluationContext::load(cfg, &source, Arc::new(scorer)).expect("context");
    (dir, ctx)
}

fn group_query(protected: &str, metric: &str, thr: f64) -> GroupQuery {
    GroupQuery {
        protected: Some(protected.to_string()),
        thr: Some(thr),
        metric: Some(metric.to_string()),
    }
}

#[test]
fn snapshot_loads_with_inferred_schema() {
    let (_dir, ctx) = context();
    assert_eq!(ctx.table().len(), 6);
    assert!(ctx.table().schema().is_numeric("Age"));
    assert!(!ctx.table().schema().is_numeric("Purpose"));
    assert_eq!(
        handle_feature_list(&ctx),
        vec!["Age", "Gender", "Marital_status", "Duration", "Purpose"]
    );
}

#[test]
fn missing_snapshot_is_an_io_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let err = FsScoredDataset::at(dir.path().join("absent.json")).load().unwrap_err();
    assert!(matches!(err, FairError::Io(_)));
}

#[test]
fn gap_by_gender() {
    let (_dir, ctx) = context();
    // male: TP (0.91), FP (0.63), FP (0.55) → FPR 1.0; female: FN, TN, TP → FPR 0.0
    let resp = handle_gap(&ctx, &group_query("gender", "predictive_equality", 0.5)).unwrap();
    assert_eq!(resp.gap, 1.0);
    let resp = handle_gap(&ctx, &group_query("", "predictive_equality", 0.5)).unwrap();
    assert_eq!(resp.gap, 0.0);
    let json = serde_json::to_value(&resp).unwrap();
    assert_eq!(json["metric"], "predictive_equality");
}

#[test]
fn gap_is_rounded_to_four_decimals() {
    let (_dir, ctx) = context();
    // <30: rows 22 (TP), 29 (TN) → DP 0.5; ≥30: 35 (FN), 47 (FP), 61 (TP), 30 (FP) → DP 0.75
    let resp = handle_gap(&ctx, &group_query("age", "demographic_parity", 0.5)).unwrap();
    assert_eq!(resp.gap, 0.25);
    let report = handle_disparity(&ctx, &group_query("age", "demographic_parity", 0.5)).unwrap();
    assert_eq!(report.groups[0].metric.label, "<30");
    assert_eq!(report.groups[1].metric.label, "≥30");
}

#[test]
fn unknown_names_fail_at_the_boundary() {
    let (_dir, ctx) = context();
    let err = handle_gap(&ctx, &group_query("religion", "equal_opportunity", 0.5)).unwrap_err();
    assert_eq!(ErrorBody::from(&err).status, 400);
    assert!(matches!(err, FairError::UnknownSelector(_)));

    let err = handle_gap(&ctx, &group_query("gender", "accuracy", 0.5)).unwrap_err();
    assert!(matches!(err, FairError::UnknownMetric(_)));

    let err = handle_heatmap(
        &ctx,
        &HeatmapQuery {
            metric: "equal_opportunity".into(),
            feature: "Salary".into(),
            ..HeatmapQuery::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, FairError::UnknownFeature(_)));
}

#[test]
fn graph_by_gender_and_marital_status() {
    let (_dir, ctx) = context();
    let graph = handle_graph(&ctx, &group_query("gender,marital_status", "equal_opportunity", 0.5)).unwrap();
    let names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "GT+",
            "GT-",
            "Male | Single",
            "Female | Married",
            "Male | Married",
            "Female | Single",
            "Female | Divorced",
            "TP",
            "FP",
            "TN",
            "FN"
        ]
    );
    let male_single = graph.node_index("Male | Single").unwrap();
    let total: u64 = graph.links_from(male_single).map(|l| l.value).sum();
    assert_eq!(total, 2);
}

#[test]
fn heatmap_over_duration_by_age() {
    let (_dir, ctx) = context();
    let matrix = handle_heatmap(
        &ctx,
        &HeatmapQuery {
            metric: "equalized_odds".into(),
            feature: "Duration".into(),
            bins: Some(2),
            thr: Some(0.5),
            component: Some("fpr".into()),
            prot: None,
        },
    )
    .unwrap();
    // durations 6,12,24,36,12,48 → edges 6, 18, 48
    assert_eq!(matrix.rows, ["6–18", "18–48"]);
    assert_eq!(matrix.cols, ["<30", "≥30"]);
    // 18–48 ∩ ≥30: rows 47 (FP) and 30 (FP) → FPR 1.0
    assert_eq!(matrix.cell("18–48", "≥30"), Some(Some(1.0)));
    // 6–18 ∩ ≥30: rows 35 (FN) and 61 (TP) → no negatives
    assert_eq!(matrix.cell("6–18", "≥30"), Some(None));
}

#[test]
fn oversized_bin_counts_are_rejected() {
    let (_dir, ctx) = context();
    for bins in [0, usize::MAX, 10_000_000_000] {
        let err = handle_heatmap(
            &ctx,
            &HeatmapQuery {
                metric: "equal_opportunity".into(),
                feature: "Duration".into(),
                bins: Some(bins),
                ..HeatmapQuery::default()
            },
        )
        .unwrap_err();
        assert!(matches!(err, FairError::InvalidInput(_)));
        assert_eq!(ErrorBody::from(&err).status, 400);
    }
}

#[test]
fn rescore_ignores_extra_columns() {
    let (_dir, ctx) = context();
    let export = handle_export(&ctx, &ExportQuery { thr: Some(0.5) }).unwrap();
    let rows = serde_json::to_value(&export.data).unwrap();
    let request: RescoreRequest = serde_json::from_value(serde_json::json!({ "rows": rows })).unwrap();
    let resp = handle_rescore(&ctx, &request).unwrap();
    assert_eq!(resp.scores.len(), 6);
    assert!(resp.scores.iter().all(|s| (0.0..=1.0).contains(s)));

    let empty = RescoreRequest { rows: Vec::new() };
    assert!(matches!(handle_rescore(&ctx, &empty), Err(FairError::InvalidInput(_))));
}

#[test]
fn concurrent_queries_share_one_context() {
    let (_dir, ctx) = context();
    let ctx = Arc::new(ctx);
    let expected = handle_gap(&ctx, &group_query("gender", "equal_opportunity", 0.5)).unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || handle_gap(&ctx, &group_query("gender", "equal_opportunity", 0.5)).unwrap())
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}
