//! Domain-specific error types and error handling.

mod types;

pub use types::{AuthError, MatchingError, StorageError, TokenError};

use kd_shared::{error_codes, ErrorResponse, IntoErrorResponse};
use thiserror::Error;

/// Core domain errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    // Bridge to specific error types
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Matching(#[from] MatchingError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Whether the caller must sign in again to recover
    pub fn requires_reauthentication(&self) -> bool {
        matches!(self, DomainError::Token(_) | DomainError::Auth(_))
    }

    /// Shorthand for a storage-unavailable error
    pub fn unavailable(operation: impl Into<String>, message: impl ToString) -> Self {
        DomainError::Storage(StorageError::Unavailable {
            operation: operation.into(),
            message: message.to_string(),
        })
    }
}

impl IntoErrorResponse for DomainError {
    fn to_error_response(&self) -> ErrorResponse {
        match self {
            DomainError::Validation { message } => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, message.clone())
            }
            DomainError::NotFound { resource } => {
                ErrorResponse::new(error_codes::NOT_FOUND, format!("{} not found", resource))
            }
            DomainError::Internal { .. } => {
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "Internal server error")
            }
            DomainError::Auth(err) => err.into(),
            DomainError::Token(err) => err.into(),
            DomainError::Matching(err) => err.into(),
            DomainError::Storage(err) => err.into(),
        }
    }
}
