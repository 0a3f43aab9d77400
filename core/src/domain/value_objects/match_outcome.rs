//! Outward result of a match resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, MatchingError, TokenError};

/// Why a resolution failed before reaching quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Reauthenticate,
}

/// Terminal state of the resolve state machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MatchOutcome {
    Resolved {
        candidate_id: Uuid,
        score: f64,
        remaining_quota_today: u32,
    },
    Denied {
        reset_at: DateTime<Utc>,
    },
    Exhausted,
    Failed {
        reason: FailureReason,
    },
}

impl MatchOutcome {
    pub fn is_resolved(&self) -> bool {
        matches!(self, MatchOutcome::Resolved { .. })
    }

    /// The error a transport should report for a non-resolved outcome
    pub fn error(&self) -> Option<DomainError> {
        match self {
            MatchOutcome::Resolved { .. } => None,
            MatchOutcome::Denied { reset_at } => Some(
                MatchingError::QuotaExceeded {
                    reset_at: *reset_at,
                }
                .into(),
            ),
            MatchOutcome::Exhausted => Some(MatchingError::NoCandidates.into()),
            MatchOutcome::Failed { .. } => Some(TokenError::AuthInvalid.into()),
        }
    }
}

/// Caller's verdict on a resolved match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Accept,
    Reject,
}
