use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::company::{CompanyResponse, UserCompanyResponse};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RequestOtpRequest {
    #[validate(length(min = 1, max = 254, message = "Email is required"))]
    #[schema(example = "user@example.com")]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254, message = "Email is required"))]
    #[schema(example = "user@example.com")]
    pub email: String,

    #[validate(length(min = 1, max = 32, message = "Code is required"))]
    #[schema(example = "123456")]
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    #[schema(example = "9f86d081884c7d659a2feaa0c55ad015")]
    pub token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    #[schema(example = 1)]
    pub user_id: i32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfileResponse {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "Jane Doe")]
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub selected_company: Option<CompanyResponse>,
    pub companies: Vec<UserCompanyResponse>,
    /// Whether the caller owns a company.
    pub is_owner: bool,
}
