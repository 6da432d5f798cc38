//! Credential store contract.
//!
//! Everything the core persists goes through [`CredentialStore`]. Lookups
//! return `Ok(None)` for a missing row so callers can tell "not found" apart
//! from a storage failure.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::StoreError;
use crate::models::{Company, CompanyMember, CompanyRole, NewUser, User, UserCompany};

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn health_check(&self) -> Result<(), StoreError>;

    // ==================== Users ====================

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError>;

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError>;

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Replace the pending one-time code. `None` clears it.
    async fn update_user_otp(
        &self,
        user_id: i32,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Clear the pending code if it equals `code` and is still live at `now`,
    /// as one atomic step. Returns `false` when nothing was consumed, so at
    /// most one caller wins for a given code.
    async fn consume_user_otp(
        &self,
        user_id: i32,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Replace the user's bearer token; the previous token stops resolving.
    async fn update_user_token(&self, user_id: i32, token: &str) -> Result<(), StoreError>;

    async fn update_user_selected_company(
        &self,
        user_id: i32,
        company_id: Option<i32>,
    ) -> Result<(), StoreError>;

    async fn get_all_users_with_token(&self) -> Result<Vec<User>, StoreError>;

    // ==================== Companies ====================

    /// Create a company owned by `owner_id`, add the owner as `admin` and
    /// select it for the owner, as one unit.
    async fn create_company(&self, owner_id: i32, name: &str) -> Result<Company, StoreError>;

    async fn get_company_by_id(&self, company_id: i32) -> Result<Option<Company>, StoreError>;

    async fn is_user_company_owner(&self, user_id: i32) -> Result<bool, StoreError>;

    async fn get_user_companies(&self, user_id: i32) -> Result<Vec<UserCompany>, StoreError>;

    // ==================== Memberships ====================

    async fn add_user_to_company(
        &self,
        company_id: i32,
        user_id: i32,
        role: CompanyRole,
    ) -> Result<(), StoreError>;

    async fn is_user_member_of_company(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<bool, StoreError>;

    async fn get_company_user_role(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<Option<CompanyRole>, StoreError>;

    async fn get_company_members(&self, company_id: i32) -> Result<Vec<CompanyMember>, StoreError>;

    /// Delete the membership and clear the user's selection if it pointed at
    /// this company. Returns `false` when there was no membership.
    async fn remove_company_member(&self, company_id: i32, user_id: i32)
        -> Result<bool, StoreError>;
}
