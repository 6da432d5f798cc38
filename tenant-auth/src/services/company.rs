//! Tenant authorization: company creation, selection and membership
//! management.
//!
//! Every operation checks, in order: authentication (a [`Session`] exists),
//! required selection, field validation, role/membership, then business
//! uniqueness.

use std::sync::Arc;
use validator::Validate;

use super::{AuthError, CredentialStore, SessionCache, StoreError};
use crate::dtos::company::{CreateCompanyRequest, InviteUserRequest, SelectCompanyRequest};
use crate::models::{Company, CompanyMember, CompanyRole, NewUser, Session, User, UserCompany};

/// The company a caller just selected, with their standing in it.
#[derive(Debug, Clone)]
pub struct SelectedCompany {
    pub company: Company,
    pub role: CompanyRole,
    pub is_owner: bool,
}

/// Outcome of an invitation.
#[derive(Debug, Clone)]
pub struct Invitation {
    pub user: User,
    pub company_id: i32,
    pub role: CompanyRole,
    pub created: bool,
}

/// Caller identity with every company membership.
#[derive(Debug, Clone)]
pub struct Profile {
    pub user: User,
    pub companies: Vec<UserCompany>,
    pub selected_company: Option<Company>,
    pub is_owner: bool,
}

#[derive(Clone)]
pub struct CompanyService {
    store: Arc<dyn CredentialStore>,
    cache: SessionCache,
}

fn selected_company(session: &Session) -> Result<i32, AuthError> {
    session
        .selected_company_id
        .ok_or(AuthError::NoSelectedCompany)
}

impl CompanyService {
    pub fn new(store: Arc<dyn CredentialStore>, cache: SessionCache) -> Self {
        Self { store, cache }
    }

    async fn require_admin(&self, company_id: i32, user_id: i32) -> Result<(), AuthError> {
        match self.store.get_company_user_role(company_id, user_id).await? {
            Some(role) if role.is_admin() => Ok(()),
            _ => Err(AuthError::NotAdmin),
        }
    }

    /// Create a company owned by the caller and select it.
    #[tracing::instrument(skip(self, session, req), fields(user_id = session.user_id))]
    pub async fn create_company(
        &self,
        session: &Session,
        req: &CreateCompanyRequest,
    ) -> Result<Company, AuthError> {
        req.validate()?;
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AuthError::InvalidArgument(
                "Company name is required".to_string(),
            ));
        }

        if self.store.is_user_company_owner(session.user_id).await? {
            return Err(AuthError::AlreadyOwner);
        }

        let company = self
            .store
            .create_company(session.user_id, name)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::AlreadyOwner,
                other => AuthError::Store(other),
            })?;

        self.cache.update_if_present(&session.token, |cached| {
            cached.selected_company_id = Some(company.id)
        });

        tracing::info!(company_id = company.id, "Company created");
        Ok(company)
    }

    /// Make `company_id` the caller's current company.
    #[tracing::instrument(skip(self, session, req), fields(user_id = session.user_id))]
    pub async fn select_company(
        &self,
        session: &Session,
        req: &SelectCompanyRequest,
    ) -> Result<SelectedCompany, AuthError> {
        req.validate()?;

        let role = self
            .store
            .get_company_user_role(req.company_id, session.user_id)
            .await?
            .ok_or(AuthError::NotCompanyMember)?;
        let company = self
            .store
            .get_company_by_id(req.company_id)
            .await?
            .ok_or(AuthError::CompanyNotFound)?;

        self.store
            .update_user_selected_company(session.user_id, Some(company.id))
            .await?;
        // A token revoked meanwhile stays evicted; the store row is already current
        self.cache.update_if_present(&session.token, |cached| {
            cached.selected_company_id = Some(company.id)
        });

        let is_owner = company.is_owned_by(session.user_id);
        Ok(SelectedCompany {
            company,
            role,
            is_owner,
        })
    }

    /// Add a user (created if needed) to the caller's selected company.
    #[tracing::instrument(skip(self, session, req), fields(user_id = session.user_id))]
    pub async fn invite_user(
        &self,
        session: &Session,
        req: &InviteUserRequest,
    ) -> Result<Invitation, AuthError> {
        let company_id = selected_company(session)?;

        req.validate()?;
        let role: CompanyRole = req.role.parse().map_err(AuthError::InvalidArgument)?;

        self.require_admin(company_id, session.user_id).await?;

        let (user, created) = match self.store.find_user_by_email(&req.email).await? {
            Some(existing) => {
                if self
                    .store
                    .is_user_member_of_company(company_id, existing.id)
                    .await?
                {
                    return Err(AuthError::AlreadyMember);
                }
                (existing, false)
            }
            None => {
                let user = self
                    .store
                    .create_user(NewUser {
                        email: req.email.clone(),
                        name: req.name.clone(),
                        selected_company_id: Some(company_id),
                    })
                    .await?;
                (user, true)
            }
        };

        self.store
            .add_user_to_company(company_id, user.id, role)
            .await
            .map_err(|e| match e {
                StoreError::Conflict(_) => AuthError::AlreadyMember,
                other => AuthError::Store(other),
            })?;

        tracing::info!(
            company_id,
            invitee_id = user.id,
            role = %role,
            created,
            "User invited"
        );
        Ok(Invitation {
            user,
            company_id,
            role,
            created,
        })
    }

    /// Members of the caller's selected company.
    pub async fn list_members(&self, session: &Session) -> Result<Vec<CompanyMember>, AuthError> {
        let company_id = selected_company(session)?;

        if !self
            .store
            .is_user_member_of_company(company_id, session.user_id)
            .await?
        {
            return Err(AuthError::NotCompanyMember);
        }

        Ok(self.store.get_company_members(company_id).await?)
    }

    /// Remove `user_id` from the caller's selected company.
    #[tracing::instrument(skip(self, session), fields(caller_id = session.user_id))]
    pub async fn remove_member(&self, session: &Session, user_id: i32) -> Result<(), AuthError> {
        let company_id = selected_company(session)?;

        if user_id <= 0 {
            return Err(AuthError::InvalidArgument("User id is required".to_string()));
        }
        if user_id == session.user_id {
            return Err(AuthError::CannotRemoveSelf);
        }

        self.require_admin(company_id, session.user_id).await?;

        if !self
            .store
            .is_user_member_of_company(company_id, user_id)
            .await?
        {
            return Err(AuthError::NotCompanyMember);
        }
        let company = self
            .store
            .get_company_by_id(company_id)
            .await?
            .ok_or(AuthError::CompanyNotFound)?;
        if company.is_owned_by(user_id) {
            return Err(AuthError::CannotRemoveOwner);
        }

        if !self.store.remove_company_member(company_id, user_id).await? {
            return Err(AuthError::NotCompanyMember);
        }
        self.cache.invalidate_by_user(user_id);

        tracing::info!(company_id, removed_user_id = user_id, "Member removed");
        Ok(())
    }

    /// Caller identity, memberships and current selection.
    pub async fn get_profile(&self, session: &Session) -> Result<Profile, AuthError> {
        let user = self
            .store
            .find_user_by_id(session.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let companies = self.store.get_user_companies(user.id).await?;
        let selected_company = user.selected_company_id.and_then(|id| {
            companies
                .iter()
                .find(|uc| uc.company.id == id)
                .map(|uc| uc.company.clone())
        });
        let is_owner = self.store.is_user_company_owner(user.id).await?;

        Ok(Profile {
            user,
            companies,
            selected_company,
            is_owner,
        })
    }
}
