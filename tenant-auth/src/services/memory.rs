//! In-memory credential store for tests and local runs without PostgreSQL.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use subtle::ConstantTimeEq;

use super::{CredentialStore, StoreError};
use crate::models::{Company, CompanyMember, CompanyRole, NewUser, User, UserCompany};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i32, User>,
    companies: BTreeMap<i32, Company>,
    memberships: HashMap<(i32, i32), CompanyRole>,
    next_user_id: i32,
    next_company_id: i32,
}

/// Mutex-guarded tables mirroring the PostgreSQL schema constraints
/// (unique email, unique token, one owned company per user, unique membership).
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    token_lookups: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `find_user_by_token` calls served so far.
    pub fn token_lookups(&self) -> usize {
        self.token_lookups.load(Ordering::SeqCst)
    }

    /// Snapshot of a user row.
    pub fn user(&self, user_id: i32) -> Option<User> {
        self.lock().ok()?.users.get(&user_id).cloned()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|e| StoreError::Storage(anyhow::anyhow!("In-memory store mutex poisoned: {}", e)))
    }
}

fn user_mut(tables: &mut Tables, user_id: i32) -> Result<&mut User, StoreError> {
    tables
        .users
        .get_mut(&user_id)
        .ok_or(StoreError::NotFound("user"))
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn health_check(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, user_id: i32) -> Result<Option<User>, StoreError> {
        Ok(self.lock()?.users.get(&user_id).cloned())
    }

    async fn find_user_by_token(&self, token: &str) -> Result<Option<User>, StoreError> {
        self.token_lookups.fetch_add(1, Ordering::SeqCst);
        let tables = self.lock()?;
        Ok(tables
            .users
            .values()
            .find(|u| u.token.as_deref() == Some(token))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.lock()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \"users_email_key\"".to_string(),
            ));
        }

        tables.next_user_id += 1;
        let row = User {
            id: tables.next_user_id,
            email: user.email,
            name: user.name,
            selected_company_id: user.selected_company_id,
            otp: None,
            otp_expires_at: None,
            token: None,
            created_at: Utc::now(),
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_user_otp(
        &self,
        user_id: i32,
        otp: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        let user = user_mut(&mut tables, user_id)?;
        user.otp = otp.map(str::to_string);
        user.otp_expires_at = expires_at;
        Ok(())
    }

    async fn consume_user_otp(
        &self,
        user_id: i32,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        let user = user_mut(&mut tables, user_id)?;
        let matches = user.has_live_otp(now)
            && user
                .otp
                .as_deref()
                .is_some_and(|stored| bool::from(stored.as_bytes().ct_eq(code.as_bytes())));
        if matches {
            user.otp = None;
            user.otp_expires_at = None;
        }
        Ok(matches)
    }

    async fn update_user_token(&self, user_id: i32, token: &str) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if tables
            .users
            .values()
            .any(|u| u.id != user_id && u.token.as_deref() == Some(token))
        {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \"users_token_key\"".to_string(),
            ));
        }
        user_mut(&mut tables, user_id)?.token = Some(token.to_string());
        Ok(())
    }

    async fn update_user_selected_company(
        &self,
        user_id: i32,
        company_id: Option<i32>,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        user_mut(&mut tables, user_id)?.selected_company_id = company_id;
        Ok(())
    }

    async fn get_all_users_with_token(&self) -> Result<Vec<User>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .values()
            .filter(|u| u.token.is_some())
            .cloned()
            .collect())
    }

    async fn create_company(&self, owner_id: i32, name: &str) -> Result<Company, StoreError> {
        let mut tables = self.lock()?;
        if !tables.users.contains_key(&owner_id) {
            return Err(StoreError::NotFound("user"));
        }
        if tables.companies.values().any(|c| c.owner_id == owner_id) {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \"companies_owner_id_key\"".to_string(),
            ));
        }

        tables.next_company_id += 1;
        let company = Company {
            id: tables.next_company_id,
            name: name.to_string(),
            owner_id,
            created_at: Utc::now(),
        };
        tables.companies.insert(company.id, company.clone());
        tables
            .memberships
            .insert((company.id, owner_id), CompanyRole::Admin);
        user_mut(&mut tables, owner_id)?.selected_company_id = Some(company.id);
        Ok(company)
    }

    async fn get_company_by_id(&self, company_id: i32) -> Result<Option<Company>, StoreError> {
        Ok(self.lock()?.companies.get(&company_id).cloned())
    }

    async fn is_user_company_owner(&self, user_id: i32) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .companies
            .values()
            .any(|c| c.owner_id == user_id))
    }

    async fn get_user_companies(&self, user_id: i32) -> Result<Vec<UserCompany>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .companies
            .values()
            .filter_map(|company| {
                tables
                    .memberships
                    .get(&(company.id, user_id))
                    .map(|role| UserCompany {
                        company: company.clone(),
                        role: *role,
                    })
            })
            .collect())
    }

    async fn add_user_to_company(
        &self,
        company_id: i32,
        user_id: i32,
        role: CompanyRole,
    ) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        if !tables.companies.contains_key(&company_id) {
            return Err(StoreError::NotFound("company"));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(StoreError::NotFound("user"));
        }
        if tables.memberships.contains_key(&(company_id, user_id)) {
            return Err(StoreError::Conflict(
                "duplicate key value violates unique constraint \"company_users_pkey\"".to_string(),
            ));
        }
        tables.memberships.insert((company_id, user_id), role);
        Ok(())
    }

    async fn is_user_member_of_company(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<bool, StoreError> {
        Ok(self
            .lock()?
            .memberships
            .contains_key(&(company_id, user_id)))
    }

    async fn get_company_user_role(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<Option<CompanyRole>, StoreError> {
        Ok(self
            .lock()?
            .memberships
            .get(&(company_id, user_id))
            .copied())
    }

    async fn get_company_members(&self, company_id: i32) -> Result<Vec<CompanyMember>, StoreError> {
        let tables = self.lock()?;
        Ok(tables
            .users
            .values()
            .filter_map(|user| {
                tables
                    .memberships
                    .get(&(company_id, user.id))
                    .map(|role| CompanyMember {
                        user_id: user.id,
                        email: user.email.clone(),
                        name: user.name.clone(),
                        role: *role,
                    })
            })
            .collect())
    }

    async fn remove_company_member(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<bool, StoreError> {
        let mut tables = self.lock()?;
        if tables.memberships.remove(&(company_id, user_id)).is_none() {
            return Ok(false);
        }
        if let Some(user) = tables.users.get_mut(&user_id) {
            if user.selected_company_id == Some(company_id) {
                user.selected_company_id = None;
            }
        }
        Ok(true)
    }
}
