//! Services layer for tenant-auth.
//!
//! Credential storage, one-time codes, bearer tokens, the session cache and
//! the tenant authorization rules built on top of them.

mod auth;
mod company;
mod database;
mod email;
pub mod error;
mod gate;
mod memory;
mod otp;
mod session_cache;
#[cfg(test)]
pub(crate) mod stalling;
mod store;
mod token;

pub use auth::AuthService;
pub use company::{CompanyService, Invitation, Profile, SelectedCompany};
pub use database::Database;
pub use email::{DisabledEmailService, EmailProvider, EmailService, MockEmailService, SentEmail};
pub use error::{AuthError, ErrorKind, StoreError};
pub use gate::{extract_bearer, AuthGate, PUBLIC_OPERATIONS};
pub use memory::InMemoryStore;
pub use otp::{generate_code, OtpIssuer};
pub use session_cache::SessionCache;
pub use store::CredentialStore;
pub use token::TokenMinter;
