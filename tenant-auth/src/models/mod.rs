//! Domain models for tenant-auth.

mod company;
mod session;
mod user;

pub use company::{Company, CompanyMember, CompanyRole, UserCompany};
pub use session::Session;
pub use user::{NewUser, User};
