//! Quota tracker implementation

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use crate::domain::entities::EntitlementTier;
use crate::domain::value_objects::QuotaStatus;
use crate::errors::DomainResult;
use crate::repositories::QuotaRepository;
use crate::services::clock::Clock;

use super::config::QuotaConfig;

/// Tracks how many matches each identity resolved today
pub struct QuotaTracker<Q: QuotaRepository> {
    repository: Arc<Q>,
    clock: Arc<dyn Clock>,
    config: QuotaConfig,
}

impl<Q: QuotaRepository> QuotaTracker<Q> {
    pub fn new(repository: Arc<Q>, clock: Arc<dyn Clock>, config: QuotaConfig) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    pub fn config(&self) -> &QuotaConfig {
        &self.config
    }

    /// Calendar date of `at` in the reference timezone
    pub fn day_of(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.config.utc_offset).date_naive()
    }

    /// Today's date in the reference timezone
    pub fn today(&self) -> NaiveDate {
        self.day_of(self.clock.now())
    }

    /// Instant `day` ends, i.e. the following midnight in the reference timezone
    pub fn reset_at_for(&self, day: NaiveDate) -> DateTime<Utc> {
        day.succ_opt()
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .and_then(|midnight| self.config.utc_offset.from_local_datetime(&midnight).single())
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Next midnight in the reference timezone
    pub fn reset_at(&self) -> DateTime<Utc> {
        self.reset_at_for(self.today())
    }

    pub fn limit(&self, tier: EntitlementTier) -> u32 {
        self.config.limit_for(tier)
    }

    /// Resolutions recorded for the identity today
    pub async fn used_today(&self, identity_id: Uuid) -> DomainResult<u32> {
        self.repository.count(identity_id, self.today()).await
    }

    /// Resolutions still allowed today
    pub async fn remaining(&self, identity_id: Uuid, tier: EntitlementTier) -> DomainResult<u32> {
        let used = self.used_today(identity_id).await?;
        Ok(self.limit(tier).saturating_sub(used))
    }

    /// Takes one unit of today's quota if any is left
    ///
    /// Check and increment happen as one atomic step in the repository, so
    /// concurrent callers can never push the count past the limit.
    pub async fn consume(&self, identity_id: Uuid, tier: EntitlementTier) -> DomainResult<bool> {
        let day = self.today();
        Ok(self.consume_on(identity_id, tier, day).await?.is_some())
    }

    /// Takes one unit of the quota for `day`, returning the count after it
    pub async fn consume_on(
        &self,
        identity_id: Uuid,
        tier: EntitlementTier,
        day: NaiveDate,
    ) -> DomainResult<Option<u32>> {
        let limit = self.limit(tier);
        let result = self.repository.try_increment(identity_id, day, limit).await?;

        match result {
            Some(used) => tracing::debug!(
                identity_id = %identity_id,
                %day,
                used,
                limit,
                "Consumed match quota"
            ),
            None => tracing::info!(
                identity_id = %identity_id,
                %day,
                limit,
                "Daily match quota exhausted"
            ),
        }
        Ok(result)
    }

    /// Snapshot of today's quota for the identity
    pub async fn status(&self, identity_id: Uuid, tier: EntitlementTier) -> DomainResult<QuotaStatus> {
        let day = self.today();
        let limit = self.limit(tier);
        let used = self.repository.count(identity_id, day).await?;

        Ok(QuotaStatus {
            tier,
            limit,
            used,
            remaining: limit.saturating_sub(used),
            reset_at: self.reset_at_for(day),
        })
    }

    /// Removes counters older than `keep_days` days
    pub async fn prune(&self, keep_days: u32) -> DomainResult<usize> {
        let cutoff = self.today() - Duration::days(i64::from(keep_days));
        let removed = self.repository.prune_before(cutoff).await?;
        if removed > 0 {
            tracing::info!(removed, %cutoff, "Pruned stale quota counters");
        }
        Ok(removed)
    }
}
