//! Configuration for the quota tracker

use chrono::{FixedOffset, Offset, Utc};
use kd_shared::MatchingConfig;

use crate::domain::entities::EntitlementTier;
use crate::errors::DomainError;

/// Per-tier daily limits and the reference timezone for day boundaries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaConfig {
    pub free_daily_limit: u32,
    pub premium_daily_limit: u32,
    pub utc_offset: FixedOffset,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            free_daily_limit: 2,
            premium_daily_limit: 10,
            utc_offset: Utc.fix(),
        }
    }
}

impl QuotaConfig {
    /// Daily limit for a tier
    pub fn limit_for(&self, tier: EntitlementTier) -> u32 {
        match tier {
            EntitlementTier::Free => self.free_daily_limit,
            EntitlementTier::Premium => self.premium_daily_limit,
        }
    }

    /// Set the reference timezone offset in hours east of UTC
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Result<Self, DomainError> {
        self.utc_offset = offset_from_minutes(hours * 60)?;
        Ok(self)
    }
}

impl TryFrom<&MatchingConfig> for QuotaConfig {
    type Error = DomainError;

    fn try_from(config: &MatchingConfig) -> Result<Self, Self::Error> {
        Ok(Self {
            free_daily_limit: config.free_daily_limit,
            premium_daily_limit: config.premium_daily_limit,
            utc_offset: offset_from_minutes(config.utc_offset_minutes)?,
        })
    }
}

fn offset_from_minutes(minutes: i32) -> Result<FixedOffset, DomainError> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| DomainError::Validation {
            message: format!("UTC offset out of range: {} minutes", minutes),
        })
}
