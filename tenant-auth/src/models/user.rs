//! User model - accounts authenticated by email one-time code.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// User entity.
///
/// `otp`/`otp_expires_at` hold the pending login code and `token` the single
/// active bearer credential; issuing a new token replaces the previous one.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub name: String,
    pub selected_company_id: Option<i32>,
    pub otp: Option<String>,
    pub otp_expires_at: Option<DateTime<Utc>>,
    pub token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Whether a pending one-time code exists and has not yet expired at `now`.
    pub fn has_live_otp(&self, now: DateTime<Utc>) -> bool {
        match (&self.otp, self.otp_expires_at) {
            (Some(_), Some(expires_at)) => now < expires_at,
            _ => false,
        }
    }
}

/// Fields required to create a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub selected_company_id: Option<i32>,
}
