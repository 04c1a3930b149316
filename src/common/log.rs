//! Structured logging emitting JSON lines through `tracing`.

use tracing_subscriber::EnvFilter;

use super::config::AppCfg;

/// Install the JSON-lines subscriber. `RUST_LOG` wins over the configured filter.
///
/// Calling this twice is harmless; the first subscriber stays in place.
pub fn init_logging(cfg: &AppCfg) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&cfg.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let installed = tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_current_span(false)
        .with_target(true)
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!(module = "common::log", event = "init", filter = %cfg.log_filter, "logging ready");
    }
}
