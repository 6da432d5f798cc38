use service_core::error::AppError;
use thiserror::Error;

/// Failure reported by a [`CredentialStore`](super::CredentialStore).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness constraint rejected the write.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound("row"),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            other => StoreError::Storage(anyhow::Error::new(other)),
        }
    }
}

/// Transport-neutral error classes surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthenticated,
    NotFound,
    InvalidArgument,
    PermissionDenied,
    FailedPrecondition,
    AlreadyExists,
    Internal,
}

/// Errors raised by authentication and tenant authorization.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("Invalid or expired one-time code")]
    InvalidCredential,

    #[error("User not found")]
    UserNotFound,

    #[error("Company not found")]
    CompanyNotFound,

    #[error("{0}")]
    InvalidArgument(String),

    #[error("User already owns a company")]
    AlreadyOwner,

    #[error("User is not a member of this company")]
    NotCompanyMember,

    #[error("Only admins of the selected company can do this")]
    NotAdmin,

    #[error("No company selected")]
    NoSelectedCompany,

    #[error("User is already a member of this company")]
    AlreadyMember,

    #[error("Cannot remove yourself from the company")]
    CannotRemoveSelf,

    #[error("The company owner cannot be removed")]
    CannotRemoveOwner,

    #[error("Failed to dispatch email: {0}")]
    Mail(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Unauthenticated(_) | AuthError::InvalidCredential => {
                ErrorKind::Unauthenticated
            }
            AuthError::UserNotFound | AuthError::CompanyNotFound => ErrorKind::NotFound,
            AuthError::InvalidArgument(_) | AuthError::CannotRemoveSelf => {
                ErrorKind::InvalidArgument
            }
            AuthError::NotCompanyMember | AuthError::NotAdmin | AuthError::CannotRemoveOwner => {
                ErrorKind::PermissionDenied
            }
            AuthError::AlreadyOwner | AuthError::NoSelectedCompany => {
                ErrorKind::FailedPrecondition
            }
            AuthError::AlreadyMember | AuthError::Store(StoreError::Conflict(_)) => {
                ErrorKind::AlreadyExists
            }
            AuthError::Store(StoreError::NotFound(_)) => ErrorKind::NotFound,
            AuthError::Mail(_) | AuthError::Store(StoreError::Storage(_)) => ErrorKind::Internal,
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::InvalidArgument(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        let kind = err.kind();
        let message = anyhow::anyhow!(err.to_string());
        match kind {
            ErrorKind::Unauthenticated => AppError::Unauthorized(message),
            ErrorKind::NotFound => AppError::NotFound(message),
            ErrorKind::InvalidArgument => AppError::BadRequest(message),
            ErrorKind::PermissionDenied => AppError::Forbidden(message),
            ErrorKind::FailedPrecondition => AppError::FailedPrecondition(message),
            ErrorKind::AlreadyExists => AppError::Conflict(message),
            ErrorKind::Internal => match err {
                AuthError::Mail(msg) => AppError::EmailError(msg),
                AuthError::Store(StoreError::Storage(e)) => AppError::DatabaseError(e),
                other => AppError::InternalError(anyhow::anyhow!(other.to_string())),
            },
        }
    }
}
