//! Matching quota and candidate-pool configuration

use serde::{Deserialize, Serialize};

use super::env_or;

/// What a match resolution does when every candidate was already passed on today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ExhaustedPolicy {
    /// Report `Exhausted` to the caller
    #[default]
    Report,
    /// Clear today's rejection set and retry selection once
    ResetAndRetry,
}

impl std::str::FromStr for ExhaustedPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "report" => Ok(ExhaustedPolicy::Report),
            "reset_and_retry" | "reset-and-retry" => Ok(ExhaustedPolicy::ResetAndRetry),
            _ => Err(format!("Invalid exhausted policy: {}", s)),
        }
    }
}

/// Daily quota and candidate pool configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    /// Resolutions per day for the free tier
    pub free_daily_limit: u32,

    /// Resolutions per day for the premium tier
    pub premium_daily_limit: u32,

    /// Offset of the reference timezone from UTC, in minutes; day boundaries use it
    pub utc_offset_minutes: i32,

    /// Maximum number of candidates scored per resolution
    pub candidate_pool_limit: usize,

    /// Behaviour on an exhausted candidate pool
    #[serde(default)]
    pub exhausted_policy: ExhaustedPolicy,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            free_daily_limit: 2,
            premium_daily_limit: 10,
            utc_offset_minutes: 0,
            candidate_pool_limit: 50,
            exhausted_policy: ExhaustedPolicy::default(),
        }
    }
}

impl MatchingConfig {
    /// Override fields from `MATCH_*` environment variables
    pub fn from_env_or(base: Self) -> Self {
        Self {
            free_daily_limit: env_or("MATCH_FREE_DAILY_LIMIT", base.free_daily_limit),
            premium_daily_limit: env_or("MATCH_PREMIUM_DAILY_LIMIT", base.premium_daily_limit),
            utc_offset_minutes: env_or("MATCH_UTC_OFFSET_MINUTES", base.utc_offset_minutes),
            candidate_pool_limit: env_or("MATCH_POOL_LIMIT", base.candidate_pool_limit),
            exhausted_policy: env_or("MATCH_EXHAUSTED_POLICY", base.exhausted_policy),
        }
    }

    /// Set the reference timezone offset in hours
    pub fn with_utc_offset_hours(mut self, hours: i32) -> Self {
        self.utc_offset_minutes = hours * 60;
        self
    }

    /// Set the exhausted-pool policy
    pub fn with_exhausted_policy(mut self, policy: ExhaustedPolicy) -> Self {
        self.exhausted_policy = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matching_config_default() {
        let config = MatchingConfig::default();
        assert_eq!(config.free_daily_limit, 2);
        assert_eq!(config.premium_daily_limit, 10);
        assert_eq!(config.utc_offset_minutes, 0);
        assert_eq!(config.exhausted_policy, ExhaustedPolicy::Report);
    }

    #[test]
    fn test_matching_config_builder() {
        let config = MatchingConfig::default()
            .with_utc_offset_hours(8)
            .with_exhausted_policy(ExhaustedPolicy::ResetAndRetry);
        assert_eq!(config.utc_offset_minutes, 480);
        assert_eq!(config.exhausted_policy, ExhaustedPolicy::ResetAndRetry);
    }

    #[test]
    fn test_exhausted_policy_serde() {
        let json = serde_json::to_string(&ExhaustedPolicy::ResetAndRetry).unwrap();
        assert_eq!(json, "\"reset_and_retry\"");
        assert_eq!(
            "report".parse::<ExhaustedPolicy>().unwrap(),
            ExhaustedPolicy::Report
        );
    }
}
