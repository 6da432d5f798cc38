use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use service_core::error::AppError;

use crate::dtos::auth::{LoginRequest, LoginResponse, RequestOtpRequest};
use crate::dtos::{ErrorResponse, MessageResponse};
use crate::AppState;

/// Request a one-time login code by email.
///
/// The response is identical whether or not the account exists.
#[utoipa::path(
    post,
    path = "/auth/otp",
    request_body = RequestOtpRequest,
    responses(
        (status = 200, description = "Code dispatched if the account exists", body = MessageResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn request_otp(
    State(state): State<AppState>,
    Json(req): Json<RequestOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    state.auth_service.request_otp(&req).await?;
    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "If the account exists, a login code has been sent".to_string(),
        }),
    ))
}

/// Exchange a one-time code for a bearer token.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Invalid or expired code", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 429, description = "Too many requests", body = ErrorResponse)
    ),
    tag = "Authentication"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    let session = state.auth_service.login(&req).await?;
    Ok((
        StatusCode::OK,
        Json(LoginResponse {
            token: session.token,
            token_type: "Bearer".to_string(),
            user_id: session.user_id,
        }),
    ))
}
