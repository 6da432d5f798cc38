use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;

use crate::dtos::company::{
    CompanyResponse, CreateCompanyRequest, InviteUserRequest, InviteUserResponse, MemberResponse,
    SelectCompanyRequest, UserCompanyResponse,
};
use crate::dtos::ErrorResponse;
use crate::middleware::CurrentSession;
use crate::AppState;

/// Create a company owned by the caller and select it
#[utoipa::path(
    post,
    path = "/companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = CompanyResponse),
        (status = 400, description = "Invalid company name", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 412, description = "Caller already owns a company", body = ErrorResponse)
    ),
    tag = "Company",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_company(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<CreateCompanyRequest>,
) -> Result<impl IntoResponse, AppError> {
    let company = state.company_service.create_company(&session, &req).await?;
    Ok((StatusCode::CREATED, Json(CompanyResponse::from(company))))
}

/// Switch the caller's current company
#[utoipa::path(
    post,
    path = "/companies/select",
    request_body = SelectCompanyRequest,
    responses(
        (status = 200, description = "Company selected", body = UserCompanyResponse),
        (status = 400, description = "Invalid company id", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse)
    ),
    tag = "Company",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn select_company(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<SelectCompanyRequest>,
) -> Result<Json<UserCompanyResponse>, AppError> {
    let selected = state.company_service.select_company(&session, &req).await?;
    Ok(Json(UserCompanyResponse {
        company: selected.company.into(),
        role: selected.role,
        is_owner: selected.is_owner,
    }))
}

/// Invite a user into the selected company
#[utoipa::path(
    post,
    path = "/companies/invitations",
    request_body = InviteUserRequest,
    responses(
        (status = 201, description = "User added to the company", body = InviteUserResponse),
        (status = 400, description = "Invalid email, name or role", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorResponse),
        (status = 409, description = "User is already a member", body = ErrorResponse),
        (status = 412, description = "No company selected", body = ErrorResponse)
    ),
    tag = "Company",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn invite_user(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Json(req): Json<InviteUserRequest>,
) -> Result<impl IntoResponse, AppError> {
    let invitation = state.company_service.invite_user(&session, &req).await?;
    Ok((
        StatusCode::CREATED,
        Json(InviteUserResponse {
            user_id: invitation.user.id,
            company_id: invitation.company_id,
            role: invitation.role,
            created: invitation.created,
        }),
    ))
}

/// List members of the selected company
#[utoipa::path(
    get,
    path = "/companies/members",
    responses(
        (status = 200, description = "Company members", body = [MemberResponse]),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not a member", body = ErrorResponse),
        (status = 412, description = "No company selected", body = ErrorResponse)
    ),
    tag = "Company",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_members(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Result<Json<Vec<MemberResponse>>, AppError> {
    let members = state.company_service.list_members(&session).await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

/// Remove a member from the selected company
#[utoipa::path(
    delete,
    path = "/companies/members/{user_id}",
    params(
        ("user_id" = i32, Path, description = "Member to remove")
    ),
    responses(
        (status = 204, description = "Member removed"),
        (status = 400, description = "Invalid target or self-removal", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Caller is not an admin, target not a member, or target owns the company", body = ErrorResponse),
        (status = 412, description = "No company selected", body = ErrorResponse)
    ),
    tag = "Company",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn remove_member(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(user_id): Path<i32>,
) -> Result<StatusCode, AppError> {
    state
        .company_service
        .remove_member(&session, user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
