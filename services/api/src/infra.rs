use digima_report::analytics::MarketingDataGateway;
use digima_report::error::AppError;
use metrics_exporter_prometheus::PrometheusHandle;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) gateway: Arc<dyn MarketingDataGateway>,
    pub(crate) template_path: Option<String>,
}

/// Writes a CLI artifact into the configured output directory.
pub(crate) fn write_artifact(dir: &Path, name: &str, contents: &str) -> Result<PathBuf, AppError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    info!(path = %path.display(), bytes = contents.len(), "artifact written");
    Ok(path)
}
