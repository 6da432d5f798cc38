use crate::error::AppError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Install the process-wide Prometheus recorder and return the render handle.
pub fn init_metrics() -> Result<PrometheusHandle, AppError> {
    PrometheusBuilder::new().install_recorder().map_err(|e| {
        tracing::error!("Failed to install Prometheus recorder: {}", e);
        AppError::ConfigError(anyhow::anyhow!("Failed to initialize metrics: {}", e))
    })
}
