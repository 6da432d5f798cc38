//! Company model - tenants, memberships and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

/// Role a user holds inside a company.
///
/// Ownership is not a role: it is derived from `Company::owner_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CompanyRole {
    Admin,
    Member,
}

impl CompanyRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanyRole::Admin => "admin",
            CompanyRole::Member => "member",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, CompanyRole::Admin)
    }
}

impl fmt::Display for CompanyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompanyRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(CompanyRole::Admin),
            "member" => Ok(CompanyRole::Member),
            _ => Err(format!("role must be 'admin' or 'member', got '{}'", s)),
        }
    }
}

/// Company (tenant) entity.
#[derive(Debug, Clone, FromRow)]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub owner_id: i32,
    pub created_at: DateTime<Utc>,
}

impl Company {
    pub fn is_owned_by(&self, user_id: i32) -> bool {
        self.owner_id == user_id
    }
}

/// A company seen from one of its members.
#[derive(Debug, Clone)]
pub struct UserCompany {
    pub company: Company,
    pub role: CompanyRole,
}

/// A member listed inside a company.
#[derive(Debug, Clone)]
pub struct CompanyMember {
    pub user_id: i32,
    pub email: String,
    pub name: String,
    pub role: CompanyRole,
}
