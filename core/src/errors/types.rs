//! Error types for tokens, login, matching and storage.
//!
//! Authentication failures share one wire code so callers cannot tell a forged
//! token from an expired, revoked or replayed one.

use chrono::{DateTime, Utc};
use kd_shared::{error_codes, ErrorResponse};
use thiserror::Error;

const REAUTHENTICATE_MESSAGE: &str = "Please sign in again";

/// Token-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Bad signature, malformed, expired or revoked credential
    #[error("Authentication invalid")]
    AuthInvalid,

    /// A rotated-away or unknown refresh token was presented
    #[error("Refresh token reuse detected")]
    RefreshReuseDetected,

    #[error("Token generation failed")]
    TokenGenerationFailed,
}

/// Login errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Unknown login handle or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account inactive")]
    AccountInactive,
}

/// Matching-related errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MatchingError {
    #[error("Daily match quota exceeded, resets at {reset_at}")]
    QuotaExceeded { reset_at: DateTime<Utc> },

    #[error("No new candidates available")]
    NoCandidates,

    #[error("Unknown question: {id}")]
    UnknownQuestion { id: String },

    #[error("Answer does not fit question: {question_id}")]
    InvalidAnswer { question_id: String },
}

/// Storage collaborator errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Storage unavailable during {operation}: {message}")]
    Unavailable { operation: String, message: String },
}

impl From<&TokenError> for ErrorResponse {
    fn from(err: &TokenError) -> Self {
        match err {
            TokenError::AuthInvalid | TokenError::RefreshReuseDetected => {
                ErrorResponse::new(error_codes::REAUTHENTICATE, REAUTHENTICATE_MESSAGE)
            }
            TokenError::TokenGenerationFailed => {
                ErrorResponse::new(error_codes::INTERNAL_ERROR, "Internal server error")
            }
        }
    }
}

impl From<&AuthError> for ErrorResponse {
    fn from(_: &AuthError) -> Self {
        ErrorResponse::new(error_codes::REAUTHENTICATE, REAUTHENTICATE_MESSAGE)
    }
}

impl From<&MatchingError> for ErrorResponse {
    fn from(err: &MatchingError) -> Self {
        match err {
            MatchingError::QuotaExceeded { reset_at } => {
                ErrorResponse::new(error_codes::QUOTA_EXCEEDED, err.to_string())
                    .add_detail("reset_at", reset_at)
                    .add_detail("remaining", 0)
            }
            MatchingError::NoCandidates => {
                ErrorResponse::new(error_codes::NO_CANDIDATES, err.to_string())
            }
            MatchingError::UnknownQuestion { .. } | MatchingError::InvalidAnswer { .. } => {
                ErrorResponse::new(error_codes::VALIDATION_ERROR, err.to_string())
            }
        }
    }
}

impl From<&StorageError> for ErrorResponse {
    fn from(_: &StorageError) -> Self {
        ErrorResponse::new(
            error_codes::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable",
        )
    }
}
