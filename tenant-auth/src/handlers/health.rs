use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::HealthResponse;
use crate::AppState;

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Credential store unreachable")
    ),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    state.store.health_check().await.map_err(|e| {
        tracing::error!(error = %e, "Credential store health check failed");
        AppError::ServiceUnavailable
    })?;

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        service: state.config.service_name.clone(),
        version: state.config.service_version.clone(),
        store: "up".to_string(),
    }))
}
