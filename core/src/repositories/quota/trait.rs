//! Day-keyed per-identity stores: the quota counter and the rejection set.
//!
//! Both are keyed by the calendar date in the reference timezone. Entries for
//! earlier days are treated as absent; nothing is ever decremented.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use uuid::Uuid;

use crate::errors::DomainResult;

/// Per-identity counter of resolutions per day
#[async_trait]
pub trait QuotaRepository: Send + Sync {
    /// Number of resolutions recorded for `day`; zero when absent
    async fn count(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<u32>;

    /// Atomically increment the counter for `day` iff it is below `limit`
    ///
    /// # Returns
    /// * `Ok(Some(count))` - Incremented; `count` is the new value
    /// * `Ok(None)` - The counter already reached `limit`
    async fn try_increment(&self, identity_id: Uuid, day: NaiveDate, limit: u32) -> DomainResult<Option<u32>>;

    /// Drop counters for days before `day`, returning how many were removed
    async fn prune_before(&self, day: NaiveDate) -> DomainResult<usize>;
}

/// Per-identity set of candidates passed on during a day
#[async_trait]
pub trait RejectionRepository: Send + Sync {
    async fn add_rejection(&self, identity_id: Uuid, day: NaiveDate, candidate_id: Uuid) -> DomainResult<()>;

    async fn rejections(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<HashSet<Uuid>>;

    async fn clear_rejections(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<()>;
}
