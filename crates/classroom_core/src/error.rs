//! crates/classroom_core/src/error.rs
//!
//! The error taxonomy surfaced by the core services to their callers.

use crate::ports::PortError;

/// Every failure a core operation can report.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Forbidden(String),

    /// The entity is absent, or outside the caller's scope.
    #[error("{0}")]
    NotFound(String),

    #[error("Recipient user not found")]
    RecipientNotFound,

    #[error("Sender user not found")]
    SenderNotFound,

    #[error("Internal error: {0}")]
    Internal(#[source] PortError),
}

impl ServiceError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    pub fn forbidden(reason: impl Into<String>) -> Self {
        Self::Forbidden(reason.into())
    }

    pub fn not_found(reason: impl Into<String>) -> Self {
        Self::NotFound(reason.into())
    }

    /// A stable, machine-usable code for the error.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidInput(_) => "invalid_input",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::RecipientNotFound => "recipient_not_found",
            Self::SenderNotFound => "sender_not_found",
            Self::Internal(_) => "internal",
        }
    }
}

impl From<PortError> for ServiceError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::Unauthorized => Self::Unauthenticated,
            other => Self::Internal(other),
        }
    }
}

/// A convenience type alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = Result<T, ServiceError>;
