//! Session - the cached projection of an authenticated user.

use chrono::{DateTime, Utc};

use super::User;

/// Resolved caller identity attached to every protected request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: i32,
    pub email: String,
    pub name: String,
    pub selected_company_id: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub token: String,
}

impl Session {
    /// Build the session for `user` authenticated by `token`.
    pub fn from_user(user: &User, token: impl Into<String>) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            selected_company_id: user.selected_company_id,
            created_at: user.created_at,
            token: token.into(),
        }
    }

    /// Copy of this session with a different selected company.
    pub fn with_selected_company(&self, company_id: i32) -> Self {
        Self {
            selected_company_id: Some(company_id),
            ..self.clone()
        }
    }
}
