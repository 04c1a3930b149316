//! Transport-facing query facade: raw request parameters in, serialisable payloads out.
//!
//! All boundary validation lives here. Metric and component names are parsed
//! strictly, thresholds must lie in [0, 1], and heatmap features must exist.

use serde::{Deserialize, Serialize};

use crate::common::error::{ErrorCode, FairError, FairResult};
use crate::data::domain::FeatureRow;
use crate::data::service::RowExport;
use crate::evaluation::domain::{DisparityReport, FairnessQuery, HeatmapSpec};
use crate::evaluation::flow::FlowGraph;
use crate::evaluation::heatmap::{HeatmapMatrix, MAX_HEATMAP_BINS};
use crate::evaluation::metrics::{Metric, RateComponent};
use crate::evaluation::service::EvaluationContext;

/// Parameters shared by the gap and graph routes.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct GroupQuery {
    /// Comma-separated selectors, e.g. `gender,age`.
    #[serde(default)]
    pub protected: Option<String>,
    #[serde(default)]
    pub thr: Option<f64>,
    #[serde(default)]
    pub metric: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GapResponse {
    pub metric: Metric,
    /// Rounded to four decimals.
    pub gap: f64,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct HeatmapQuery {
    pub metric: String,
    pub feature: String,
    #[serde(default)]
    pub bins: Option<usize>,
    #[serde(default)]
    pub thr: Option<f64>,
    /// `tpr` or `fpr`; only read for equalized odds.
    #[serde(default)]
    pub component: Option<String>,
    /// Comma-separated selectors; falls back to the configured heatmap default.
    #[serde(default)]
    pub prot: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub thr: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RescoreRequest {
    #[serde(default)]
    pub rows: Vec<FeatureRow>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RescoreResponse {
    pub scores: Vec<f64>,
}

/// Error payload with the numeric code and the HTTP status it maps to.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: u32,
    #[serde(skip)]
    pub status: u16,
}

impl From<&FairError> for ErrorBody {
    fn from(err: &FairError) -> Self {
        let code: ErrorCode = err.code();
        Self {
            error: err.to_string(),
            code: code as u32,
            status: code.http_status(),
        }
    }
}

/// Split `a, b,,c` into `["a", "b", "c"]`.
pub fn parse_selectors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

// TODO: clamp instead of rejecting if the dashboard slider starts sending values outside [0, 1].
pub fn parse_threshold(raw: Option<f64>, default: f64) -> FairResult<f64> {
    let thr = raw.unwrap_or(default);
    if thr.is_finite() && (0.0..=1.0).contains(&thr) {
        Ok(thr)
    } else {
        Err(FairError::InvalidThreshold(thr))
    }
}

pub fn parse_metric(raw: Option<&str>, default: Metric) -> FairResult<Metric> {
    raw.map_or(Ok(default), str::parse)
}

fn fairness_query(ctx: &EvaluationContext, query: &GroupQuery) -> FairResult<FairnessQuery> {
    let cfg = ctx.cfg();
    Ok(FairnessQuery {
        selectors: parse_selectors(query.protected.as_deref().unwrap_or_default()),
        threshold: parse_threshold(query.thr, cfg.default_threshold)?,
        metric: parse_metric(query.metric.as_deref(), cfg.default_metric)?,
    })
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

pub fn handle_gap(ctx: &EvaluationContext, query: &GroupQuery) -> FairResult<GapResponse> {
    let query = fairness_query(ctx, query)?;
    let gap = ctx.gap(&query)?;
    Ok(GapResponse {
        metric: query.metric,
        gap: round4(gap),
    })
}

/// Per-group values behind the gap, with each group's signed pull.
pub fn handle_disparity(ctx: &EvaluationContext, query: &GroupQuery) -> FairResult<DisparityReport> {
    ctx.disparity_report(&fairness_query(ctx, query)?)
}

pub fn handle_graph(ctx: &EvaluationContext, query: &GroupQuery) -> FairResult<FlowGraph> {
    ctx.graph(&fairness_query(ctx, query)?)
}

pub fn handle_heatmap(ctx: &EvaluationContext, query: &HeatmapQuery) -> FairResult<HeatmapMatrix> {
    if !ctx.table().schema().contains(&query.feature) {
        return Err(FairError::UnknownFeature(query.feature.clone()));
    }
    let cfg = ctx.cfg();
    let bins = query.bins.unwrap_or(cfg.heatmap_bins);
    if bins == 0 || bins > MAX_HEATMAP_BINS {
        return Err(FairError::invalid(format!("bins must be between 1 and {MAX_HEATMAP_BINS}")));
    }
    let component = match query.component.as_deref() {
        Some(raw) => raw.parse::<RateComponent>()?,
        None => RateComponent::default(),
    };
    let selectors = parse_selectors(query.prot.as_deref().unwrap_or(&cfg.heatmap_protected));

    let fairness = FairnessQuery {
        selectors,
        threshold: parse_threshold(query.thr, cfg.default_threshold)?,
        metric: query.metric.parse()?,
    };
    let spec = HeatmapSpec {
        feature: query.feature.clone(),
        bins,
        component,
    };
    ctx.heatmap(&fairness, &spec)
}

pub fn handle_rescore(ctx: &EvaluationContext, request: &RescoreRequest) -> FairResult<RescoreResponse> {
    Ok(RescoreResponse {
        scores: ctx.rescore(&request.rows)?,
    })
}

pub fn handle_feature_list(ctx: &EvaluationContext) -> Vec<String> {
    ctx.feature_list()
}

pub fn handle_export(ctx: &EvaluationContext, query: &ExportQuery) -> FairResult<RowExport> {
    let thr = parse_threshold(query.thr, ctx.cfg().default_threshold)?;
    Ok(ctx.export_rows(thr))
}
