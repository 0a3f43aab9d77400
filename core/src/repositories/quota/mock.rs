//! Mock day-keyed store for testing

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};

use super::{QuotaRepository, RejectionRepository};

/// Mock quota counter and rejection set; can be switched into a failing mode
#[derive(Clone, Default)]
pub struct MockQuotaStore {
    counters: Arc<RwLock<HashMap<(Uuid, NaiveDate), u32>>>,
    rejections: Arc<RwLock<HashMap<(Uuid, NaiveDate), HashSet<Uuid>>>>,
    failing: Arc<AtomicBool>,
}

impl MockQuotaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with a storage error
    pub fn fail_all(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    fn check(&self, operation: &str) -> DomainResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::unavailable(operation, "mock store offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl QuotaRepository for MockQuotaStore {
    async fn count(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<u32> {
        self.check("quota.count")?;
        Ok(self
            .counters
            .read()
            .await
            .get(&(identity_id, day))
            .copied()
            .unwrap_or(0))
    }

    async fn try_increment(&self, identity_id: Uuid, day: NaiveDate, limit: u32) -> DomainResult<Option<u32>> {
        self.check("quota.try_increment")?;
        let mut counters = self.counters.write().await;
        let count = counters.entry((identity_id, day)).or_insert(0);
        if *count >= limit {
            return Ok(None);
        }
        *count += 1;
        Ok(Some(*count))
    }

    async fn prune_before(&self, day: NaiveDate) -> DomainResult<usize> {
        self.check("quota.prune_before")?;
        let mut counters = self.counters.write().await;
        let before = counters.len();
        counters.retain(|(_, counter_day), _| *counter_day >= day);
        Ok(before - counters.len())
    }
}

#[async_trait]
impl RejectionRepository for MockQuotaStore {
    async fn add_rejection(&self, identity_id: Uuid, day: NaiveDate, candidate_id: Uuid) -> DomainResult<()> {
        self.check("rejections.add")?;
        self.rejections
            .write()
            .await
            .entry((identity_id, day))
            .or_default()
            .insert(candidate_id);
        Ok(())
    }

    async fn rejections(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<HashSet<Uuid>> {
        self.check("rejections.list")?;
        Ok(self
            .rejections
            .read()
            .await
            .get(&(identity_id, day))
            .cloned()
            .unwrap_or_default())
    }

    async fn clear_rejections(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<()> {
        self.check("rejections.clear")?;
        self.rejections.write().await.remove(&(identity_id, day));
        Ok(())
    }
}
