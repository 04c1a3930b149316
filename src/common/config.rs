//! Runtime configuration loaded from the process environment.
//!
//! Values are read once at startup and baked into the `EvaluationContext`.
//! TODO: Accept a TOML file alongside the environment for per-dataset registries.

use std::env;

use crate::evaluation::grouping::ProtectedRegistry;
use crate::evaluation::heatmap::MAX_HEATMAP_BINS;
use crate::evaluation::metrics::Metric;

/// Snapshot of configuration values consumed by the core.
#[derive(Clone, Debug)]
pub struct AppCfg {
    pub data_root: String,
    pub dataset_file: String,
    pub log_filter: String,
    pub default_threshold: f64,
    pub default_metric: Metric,
    pub heatmap_bins: usize,
    pub heatmap_protected: String,
    /// Raw `selector=Column,...` override for the protected-attribute registry.
    pub protected: Option<String>,
}

impl Default for AppCfg {
    fn default() -> Self {
        Self {
            data_root: "./data".to_string(),
            dataset_file: "scored.json".to_string(),
            log_filter: "info".to_string(),
            default_threshold: 0.5,
            default_metric: Metric::EqualOpportunity,
            heatmap_bins: 6,
            heatmap_protected: "age".to_string(),
            protected: None,
        }
    }
}

impl AppCfg {
    /// Create a configuration snapshot from the process environment.
    pub fn load() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a snapshot from an arbitrary key lookup; unparseable values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let default_threshold = match lookup("FAIRSIGHT_THRESHOLD") {
            Some(raw) => match raw.trim().parse::<f64>() {
                Ok(v) if v.is_finite() && (0.0..=1.0).contains(&v) => v,
                _ => {
                    tracing::warn!(key = "FAIRSIGHT_THRESHOLD", value = %raw, "ignoring invalid threshold");
                    defaults.default_threshold
                }
            },
            None => defaults.default_threshold,
        };

        let default_metric = match lookup("FAIRSIGHT_METRIC") {
            Some(raw) => raw.parse::<Metric>().unwrap_or_else(|_| {
                tracing::warn!(key = "FAIRSIGHT_METRIC", value = %raw, "ignoring unknown metric");
                defaults.default_metric
            }),
            None => defaults.default_metric,
        };

        let heatmap_bins = match lookup("FAIRSIGHT_HEATMAP_BINS") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(v) if (1..=MAX_HEATMAP_BINS).contains(&v) => v,
                _ => {
                    tracing::warn!(key = "FAIRSIGHT_HEATMAP_BINS", value = %raw, "ignoring invalid bin count");
                    defaults.heatmap_bins
                }
            },
            None => defaults.heatmap_bins,
        };

        Self {
            data_root: env_or("FAIRSIGHT_DATA_ROOT", &defaults.data_root),
            dataset_file: env_or("FAIRSIGHT_DATASET", &defaults.dataset_file),
            log_filter: env_or("FAIRSIGHT_LOG", &defaults.log_filter),
            default_threshold,
            default_metric,
            heatmap_bins,
            heatmap_protected: env_or("FAIRSIGHT_HEATMAP_PROTECTED", &defaults.heatmap_protected),
            protected: lookup("FAIRSIGHT_PROTECTED"),
        }
    }

    /// Protected-attribute registry: the built-in mapping, overridden entry by entry.
    pub fn registry(&self) -> ProtectedRegistry {
        let mut registry = ProtectedRegistry::default();
        let Some(raw) = self.protected.as_deref() else {
            return registry;
        };
        for pair in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((selector, column)) if !selector.trim().is_empty() && !column.trim().is_empty() => {
                    registry.insert(selector.trim(), column.trim());
                }
                _ => tracing::warn!(entry = pair, "ignoring malformed protected attribute entry"),
            }
        }
        registry
    }
}
