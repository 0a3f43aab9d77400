//! Value objects returned by the matching surface.

pub mod match_outcome;
pub mod quota_status;

pub use match_outcome::{Decision, FailureReason, MatchOutcome};
pub use quota_status::QuotaStatus;
