use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::dtos::auth::ProfileResponse;
use crate::dtos::company::UserCompanyResponse;
use crate::dtos::ErrorResponse;
use crate::middleware::CurrentSession;
use crate::AppState;

/// Get the caller's profile and company memberships
#[utoipa::path(
    get,
    path = "/users/me",
    responses(
        (status = 200, description = "Caller profile", body = ProfileResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "User",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_me(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state.company_service.get_profile(&session).await?;
    let user_id = profile.user.id;

    Ok(Json(ProfileResponse {
        id: user_id,
        email: profile.user.email,
        name: profile.user.name,
        created_at: profile.user.created_at,
        selected_company: profile.selected_company.map(Into::into),
        companies: profile
            .companies
            .into_iter()
            .map(|membership| UserCompanyResponse::new(membership, user_id))
            .collect(),
        is_owner: profile.is_owner,
    }))
}
