//! One-time login codes: generation, dispatch and single-use validation.

use chrono::{Duration, Utc};
use rand::{rngs::OsRng, Rng};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use super::{AuthError, CredentialStore, EmailProvider};
use crate::config::OtpConfig;
use crate::models::User;

const OTP_DIGITS_MODULUS: u32 = 1_000_000;

/// Six-digit, zero-padded code drawn from the OS CSPRNG.
pub fn generate_code() -> String {
    format!("{:06}", OsRng.gen_range(0..OTP_DIGITS_MODULUS))
}

fn codes_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[derive(Clone)]
pub struct OtpIssuer {
    store: Arc<dyn CredentialStore>,
    mailer: Arc<dyn EmailProvider>,
    config: OtpConfig,
}

impl OtpIssuer {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        mailer: Arc<dyn EmailProvider>,
        config: OtpConfig,
    ) -> Self {
        Self {
            store,
            mailer,
            config,
        }
    }

    /// Addresses in the reserved test class log in with the fixed code.
    pub fn is_test_identity(&self, email: &str) -> bool {
        !self.config.test_suffix.is_empty() && email.ends_with(&self.config.test_suffix)
    }

    /// Issue and mail a fresh code. Unknown addresses succeed silently.
    #[tracing::instrument(skip(self))]
    pub async fn request_otp(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            tracing::debug!("OTP requested for unknown email");
            return Ok(());
        };

        if self.is_test_identity(email) {
            tracing::debug!(user_id = user.id, "Reserved identity, skipping OTP dispatch");
            return Ok(());
        }

        let code = generate_code();
        let expires_at = Utc::now() + Duration::seconds(self.config.ttl_seconds);
        self.store
            .update_user_otp(user.id, Some(&code), Some(expires_at))
            .await?;

        let minutes = (self.config.ttl_seconds / 60).max(1);
        let body = format!(
            "Your login code is {}.\n\nIt expires in {} minutes. If you didn't request it, ignore this email.",
            code, minutes
        );
        self.mailer
            .send_email(&user.email, "Your login code", &body)
            .await?;

        tracing::info!(user_id = user.id, "OTP issued");
        Ok(())
    }

    /// Check `code` for `email` and clear it on success.
    ///
    /// Wrong, missing and expired codes all yield
    /// [`AuthError::InvalidCredential`].
    #[tracing::instrument(skip(self, code))]
    pub async fn validate_and_consume(&self, email: &str, code: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .find_user_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if self.is_test_identity(email) {
            return if codes_match(&self.config.test_code, code) {
                Ok(user)
            } else {
                Err(AuthError::InvalidCredential)
            };
        }

        let now = Utc::now();
        let plausible = user.has_live_otp(now)
            && user
                .otp
                .as_deref()
                .is_some_and(|stored| codes_match(stored, code));

        // The row may have changed since it was read; only the store's
        // compare-and-clear decides which login gets the code.
        if !plausible || !self.store.consume_user_otp(user.id, code, now).await? {
            tracing::warn!(user_id = user.id, "OTP rejected");
            return Err(AuthError::InvalidCredential);
        }

        Ok(User {
            otp: None,
            otp_expires_at: None,
            ..user
        })
    }
}
