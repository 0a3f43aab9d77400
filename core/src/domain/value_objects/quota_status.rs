//! Snapshot of an identity's daily quota.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::EntitlementTier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaStatus {
    pub tier: EntitlementTier,
    pub limit: u32,
    pub used: u32,
    pub remaining: u32,
    /// Start of the next day in the reference timezone
    pub reset_at: DateTime<Utc>,
}
