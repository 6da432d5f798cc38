use axum::{extract::State, response::IntoResponse};
use service_core::error::AppError;

use crate::AppState;

/// Prometheus exposition of the process metrics.
pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state
        .metrics
        .as_ref()
        .map(|handle| handle.render())
        .ok_or(AppError::ServiceUnavailable)
}
