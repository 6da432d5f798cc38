//! HTTP handlers for tenant-auth.

pub mod auth;
pub mod company;
pub mod health;
pub mod metrics;
pub mod user;
