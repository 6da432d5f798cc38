//! Store wrapper that holds reads open so tests can interleave requests the
//! way concurrent callers against a real database would.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Barrier, Notify};

use super::{CredentialStore, InMemoryStore, StoreError};
use crate::models::{Company, CompanyMember, CompanyRole, NewUser, User, UserCompany};

/// One-shot pause: the first token lookup reads the row, signals `reached`,
/// then waits for `release` before returning it.
#[derive(Default)]
pub struct Pause {
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl Pause {
    pub fn armed() -> Arc<Self> {
        Arc::new(Self {
            armed: AtomicBool::new(true),
            ..Self::default()
        })
    }

    pub async fn reached(&self) {
        self.reached.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

pub struct StallingStore {
    inner: Arc<InMemoryStore>,
    email_barrier: Option<Arc<Barrier>>,
    token_pause: Option<Arc<Pause>>,
}

impl StallingStore {
    /// Every email lookup waits until `parties` lookups are in flight.
    pub fn with_email_barrier(inner: Arc<InMemoryStore>, parties: usize) -> Self {
        Self {
            inner,
            email_barrier: Some(Arc::new(Barrier::new(parties))),
            token_pause: None,
        }
    }

    pub fn with_token_pause(inner: Arc<InMemoryStore>, pause: Arc<Pause>) -> Self {
        Self {
            inner,
            email_barrier: None,
            token_pause: Some(pause),
        }
    }
}

#[async_trait]
impl CredentialStore for StallingStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.inner.health_check().await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = self.inner.find_user_by_email(email).await;
        if let Some(barrier) = &self.email_barrier {
            barrier.wait().await;
        }
        user
    }

    async fn find_user_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        self.inner.find_user_by_id(user_id).await
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        let user = self.inner.find_user_by_token(token).await;
        if let Some(pause) = &self.token_pause {
            if pause.armed.swap(false, Ordering::SeqCst) {
                pause.reached.notify_one();
                pause.release.notified().await;
            }
        }
        user
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.inner.create_user(user).await
    }

    async fn update_user_otp(
        &self,
        user_id: i32,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        self.inner.update_user_otp(user_id, otp, expires_at).await
    }

    async fn consume_user_otp(
        &self,
        user_id: i32,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.inner.consume_user_otp(user_id, code, now).await
    }

    async fn update_user_token(&self, user_id: i32, token: &str) -> Result<(), StoreError> {
        self.inner.update_user_token(user_id, token).await
    }

    async fn update_user_selected_company(
        &self,
        user_id: i32,
        company_id: Option<i32>,
    ) -> Result<(), StoreError> {
        self.inner
            .update_user_selected_company(user_id, company_id)
            .await
    }

    async fn get_all_users_with_token(&self) -> Result<Vec<User>, StoreError> {
        self.inner.get_all_users_with_token().await
    }

    async fn create_company(&self, owner_id: i32, name: &str) -> Result<Company, StoreError> {
        self.inner.create_company(owner_id, name).await
    }

    async fn get_company_by_id(&self, company_id: i32) -> Result<Option<Company>, StoreError> {
        self.inner.get_company_by_id(company_id).await
    }

    async fn is_user_company_owner(&self, user_id: i32) -> Result<bool, StoreError> {
        self.inner.is_user_company_owner(user_id).await
    }

    async fn get_user_companies(&self, user_id: i32) -> Result<Vec<UserCompany>, StoreError> {
        self.inner.get_user_companies(user_id).await
    }

    async fn add_user_to_company(
        &self,
        company_id: i32,
        user_id: i32,
        role: CompanyRole,
    ) -> Result<(), StoreError> {
        self.inner.add_user_to_company(company_id, user_id, role).await
    }

    async fn is_user_member_of_company(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<bool, StoreError> {
        self.inner.is_user_member_of_company(company_id, user_id).await
    }

    async fn get_company_user_role(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<Option<CompanyRole>, StoreError> {
        self.inner.get_company_user_role(company_id, user_id).await
    }

    async fn get_company_members(&self, company_id: i32) -> Result<Vec<CompanyMember>, StoreError> {
        self.inner.get_company_members(company_id).await
    }

    async fn remove_company_member(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<bool, StoreError> {
        self.inner.remove_company_member(company_id, user_id).await
    }
}
