use std::sync::Arc;
use validator::Validate;

use super::{AuthError, CredentialStore, OtpIssuer, SessionCache, TokenMinter};
use crate::dtos::auth::{LoginRequest, RequestOtpRequest};
use crate::models::Session;

/// Passwordless login: OTP request, code exchange for a bearer token.
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    otp: OtpIssuer,
    tokens: TokenMinter,
    cache: SessionCache,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        otp: OtpIssuer,
        tokens: TokenMinter,
        cache: SessionCache,
    ) -> Self {
        Self {
            store,
            otp,
            tokens,
            cache,
        }
    }

    pub async fn request_otp(&self, req: &RequestOtpRequest) -> Result<(), AuthError> {
        req.validate()?;
        self.otp.request_otp(&req.email).await
    }

    /// Exchange a valid code for a fresh token. Earlier sessions of the user
    /// are evicted from the cache and the new one is cached.
    #[tracing::instrument(skip(self, req), fields(email = %req.email))]
    pub async fn login(&self, req: &LoginRequest) -> Result<Session, AuthError> {
        req.validate()?;

        let user = self.otp.validate_and_consume(&req.email, &req.code).await?;

        let seen = self.cache.generation();
        let token = self.tokens.issue(user.id).await?;

        // Our own eviction accounts for exactly one generation step; any
        // other means a concurrent login may have overwritten the token.
        self.cache.invalidate_by_user(user.id);
        let session = Session::from_user(&user, token.clone());
        if !self.cache.put_if_current(token, session.clone(), seen + 1) {
            tracing::debug!(user_id = user.id, "Concurrent invalidation, session left to the store");
        }

        metrics::counter!("logins_total").increment(1);
        tracing::info!(user_id = user.id, "User logged in");
        Ok(session)
    }

    /// Warm the cache with every user currently holding a token.
    pub async fn preload_sessions(&self) -> Result<usize, AuthError> {
        let users = self.store.get_all_users_with_token().await?;
        let loaded = self.cache.preload(&users);
        tracing::info!(sessions = loaded, "Session cache preloaded");
        Ok(loaded)
    }
}
