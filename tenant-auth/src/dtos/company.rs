use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{Company, CompanyMember, CompanyRole, UserCompany};

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 255, message = "Company name is required"))]
    #[schema(example = "Acme Inc")]
    pub name: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct SelectCompanyRequest {
    #[validate(range(min = 1, message = "Company id is required"))]
    #[schema(example = 7)]
    pub company_id: i32,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct InviteUserRequest {
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "new.member@example.com")]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    #[schema(example = "New Member")]
    pub name: String,

    /// `admin` or `member`.
    #[schema(example = "member")]
    pub role: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompanyResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "Acme Inc")]
    pub name: String,
    #[schema(example = 1)]
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
}

impl From<Company> for CompanyResponse {
    fn from(company: Company) -> Self {
        Self {
            id: company.id,
            name: company.name,
            owner_id: company.owner_id,
            created_at: company.created_at,
        }
    }
}

/// A company together with the caller's standing in it.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserCompanyResponse {
    #[serde(flatten)]
    pub company: CompanyResponse,
    pub role: CompanyRole,
    pub is_owner: bool,
}

impl UserCompanyResponse {
    pub fn new(membership: UserCompany, user_id: i32) -> Self {
        let is_owner = membership.company.is_owned_by(user_id);
        Self {
            company: membership.company.into(),
            role: membership.role,
            is_owner,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct InviteUserResponse {
    #[schema(example = 12)]
    pub user_id: i32,
    #[schema(example = 7)]
    pub company_id: i32,
    pub role: CompanyRole,
    /// `true` when the invite created a new account.
    pub created: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    #[schema(example = 12)]
    pub user_id: i32,
    #[schema(example = "member@example.com")]
    pub email: String,
    #[schema(example = "Member Name")]
    pub name: String,
    pub role: CompanyRole,
}

impl From<CompanyMember> for MemberResponse {
    fn from(member: CompanyMember) -> Self {
        Self {
            user_id: member.user_id,
            email: member.email,
            name: member.name,
            role: member.role,
        }
    }
}
