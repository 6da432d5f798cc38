//! Per-call authentication: public/protected classification and
//! cache-first bearer token resolution.

use std::collections::HashSet;
use std::sync::Arc;

use super::{AuthError, CredentialStore, SessionCache};
use crate::models::Session;

/// Operations reachable without a bearer token.
pub const PUBLIC_OPERATIONS: &[&str] = &[
    "/health",
    "/auth/otp",
    "/auth/login",
    "/metrics",
    "/.well-known/openapi.json",
];

/// Extract the token from an `authorization` value of the form
/// `Bearer <token>`. The scheme is case-insensitive; the value is split once
/// on the first space.
pub fn extract_bearer(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::Unauthenticated("Missing authorization header"))?;
    match header.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() => {
            Ok(token)
        }
        _ => Err(AuthError::Unauthenticated("Invalid authorization header")),
    }
}

#[derive(Clone)]
pub struct AuthGate {
    cache: SessionCache,
    store: Arc<dyn CredentialStore>,
    public_operations: Arc<HashSet<String>>,
}

impl AuthGate {
    pub fn new(cache: SessionCache, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_public_operations(cache, store, PUBLIC_OPERATIONS.iter().copied())
    }

    pub fn with_public_operations<'a>(
        cache: SessionCache,
        store: Arc<dyn CredentialStore>,
        operations: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        Self {
            cache,
            store,
            public_operations: Arc::new(operations.into_iter().map(str::to_string).collect()),
        }
    }

    pub fn is_public(&self, operation: &str) -> bool {
        self.public_operations.contains(operation)
    }

    /// Resolve a token to its session: cache first, then the store. Store
    /// hits are cached unless a login or removal invalidated sessions while
    /// the row was being read.
    pub async fn resolve(&self, token: &str) -> Result<Session, AuthError> {
        if let Some(session) = self.cache.get(token) {
            return Ok(session);
        }

        let seen = self.cache.generation();
        let user = self
            .store
            .find_user_by_token(token)
            .await?
            .ok_or(AuthError::Unauthenticated("Invalid token"))?;

        let session = Session::from_user(&user, token);
        let cached = self.cache.put_if_current(token, session.clone(), seen);
        tracing::debug!(user_id = user.id, cached, "Session loaded from store");
        Ok(session)
    }

    /// Authenticate one call. Public operations yield `None` without looking
    /// at the header; protected ones yield the caller's session or fail.
    pub async fn authenticate(
        &self,
        operation: &str,
        authorization: Option<&str>,
    ) -> Result<Option<Session>, AuthError> {
        if self.is_public(operation) {
            return Ok(None);
        }
        let token = extract_bearer(authorization)?;
        self.resolve(token).await.map(Some)
    }
}
