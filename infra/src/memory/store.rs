//! In-memory implementation of every repository trait

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use kd_core::domain::entities::{AnswerSet, CandidateRef, Identity, QuestionBank, RefreshToken};
use kd_core::errors::{DomainError, DomainResult};
use kd_core::repositories::{IdentityDirectory, QuotaRepository, RejectionRepository, TokenRepository};

type DayKey = (Uuid, NaiveDate);

/// Single logical store backed by process memory
#[derive(Default)]
pub struct MemoryStore {
    identities: RwLock<HashMap<Uuid, Identity>>,
    answers: RwLock<HashMap<Uuid, AnswerSet>>,
    tokens: RwLock<HashMap<String, RefreshToken>>,
    counters: RwLock<HashMap<DayKey, u32>>,
    rejections: RwLock<HashMap<DayKey, HashSet<Uuid>>>,
    /// When set, recorded answers must fit their questions
    bank: Option<Arc<QuestionBank>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check recorded answers against `bank`
    pub fn with_question_bank(mut self, bank: Arc<QuestionBank>) -> Self {
        self.bank = Some(bank);
        self
    }

    /// Add an identity; emails are unique ignoring ASCII case
    pub async fn insert_identity(&self, identity: Identity) -> DomainResult<Identity> {
        let mut identities = self.identities.write().await;
        if identities
            .values()
            .any(|existing| existing.email.eq_ignore_ascii_case(&identity.email))
        {
            return Err(DomainError::Validation {
                message: format!("Email already registered: {}", identity.email),
            });
        }
        identities.insert(identity.id, identity.clone());
        Ok(identity)
    }

    /// Replace a stored identity
    pub async fn update_identity(&self, identity: Identity) -> DomainResult<Identity> {
        let mut identities = self.identities.write().await;
        match identities.get_mut(&identity.id) {
            Some(existing) => {
                *existing = identity.clone();
                Ok(identity)
            }
            None => Err(DomainError::NotFound {
                resource: format!("identity {}", identity.id),
            }),
        }
    }

    /// Merge answers into the identity's answer set, newer answers winning
    ///
    /// With a question bank attached, an unknown question id or an answer of
    /// the wrong shape rejects the whole set.
    pub async fn record_answers(&self, identity_id: Uuid, answers: AnswerSet) -> DomainResult<AnswerSet> {
        if let Some(bank) = &self.bank {
            bank.validate_answers(&answers)?;
        }
        if !self.identities.read().await.contains_key(&identity_id) {
            return Err(DomainError::NotFound {
                resource: format!("identity {}", identity_id),
            });
        }

        let mut all = self.answers.write().await;
        let merged = all.remove(&identity_id).unwrap_or_default().merge(answers);
        all.insert(identity_id, merged.clone());
        Ok(merged)
    }
}

#[async_trait]
impl IdentityDirectory for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Identity>> {
        Ok(self.identities.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Identity>> {
        Ok(self
            .identities
            .read()
            .await
            .values()
            .find(|identity| identity.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn answers_for(&self, identity_id: Uuid) -> DomainResult<AnswerSet> {
        Ok(self
            .answers
            .read()
            .await
            .get(&identity_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_active_verified(&self, excluding: Uuid) -> DomainResult<Vec<CandidateRef>> {
        let identities = self.identities.read().await;
        let answers = self.answers.read().await;

        let mut candidates: Vec<CandidateRef> = identities
            .values()
            .filter(|identity| identity.id != excluding && identity.can_match())
            .map(|identity| CandidateRef {
                id: identity.id,
                answers: answers.get(&identity.id).cloned().unwrap_or_default(),
                last_active_at: identity.last_active_at,
            })
            .collect();
        // Most recently active first; id keeps the order stable
        candidates.sort_by(|a, b| {
            b.last_active_at
                .cmp(&a.last_active_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(candidates)
    }
}

#[async_trait]
impl TokenRepository for MemoryStore {
    async fn save_refresh_token(&self, token: RefreshToken) -> DomainResult<RefreshToken> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.token_hash) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }
        tokens.insert(token.token_hash.clone(), token.clone());
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> DomainResult<Option<RefreshToken>> {
        Ok(self.tokens.read().await.get(token_hash).cloned())
    }

    async fn find_by_identity(&self, identity_id: Uuid) -> DomainResult<Vec<RefreshToken>> {
        Ok(self
            .tokens
            .read()
            .await
            .values()
            .filter(|token| token.identity_id == identity_id)
            .cloned()
            .collect())
    }

    async fn rotate_refresh_token(
        &self,
        old_hash: &str,
        successor: RefreshToken,
        now: DateTime<Utc>,
    ) -> DomainResult<bool> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&successor.token_hash) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }
        match tokens.get_mut(old_hash) {
            Some(old) if !old.is_revoked => old.mark_replaced(successor.id, now),
            _ => return Ok(false),
        }
        tokens.insert(successor.token_hash.clone(), successor);
        Ok(true)
    }

    async fn revoke_token(&self, token_hash: &str, now: DateTime<Utc>) -> DomainResult<bool> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(token_hash) {
            Some(token) if !token.is_revoked => {
                token.revoke(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all_user_tokens(&self, identity_id: Uuid, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut tokens = self.tokens.write().await;
        let mut count = 0;
        for token in tokens
            .values_mut()
            .filter(|token| token.identity_id == identity_id && !token.is_revoked)
        {
            token.revoke(now);
            count += 1;
        }
        Ok(count)
    }

    async fn revoke_token_family(&self, family_id: Uuid, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut tokens = self.tokens.write().await;
        let mut count = 0;
        for token in tokens
            .values_mut()
            .filter(|token| token.family_id == family_id && !token.is_revoked)
        {
            token.revoke(now);
            count += 1;
        }
        Ok(count)
    }

    async fn delete_expired_tokens(&self, now: DateTime<Utc>) -> DomainResult<usize> {
        let mut tokens = self.tokens.write().await;
        let before = tokens.len();
        tokens.retain(|_, token| !token.is_expired_at(now));
        Ok(before - tokens.len())
    }
}

#[async_trait]
impl QuotaRepository for MemoryStore {
    async fn count(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<u32> {
        Ok(self
            .counters
            .read()
            .await
            .get(&(identity_id, day))
            .copied()
            .unwrap_or(0))
    }

    async fn try_increment(&self, identity_id: Uuid, day: NaiveDate, limit: u32) -> DomainResult<Option<u32>> {
        let mut counters = self.counters.write().await;
        let count = counters.entry((identity_id, day)).or_insert(0);
        if *count >= limit {
            return Ok(None);
        }
        *count += 1;
        Ok(Some(*count))
    }

    async fn prune_before(&self, day: NaiveDate) -> DomainResult<usize> {
        let removed_counters = {
            let mut counters = self.counters.write().await;
            let before = counters.len();
            counters.retain(|(_, counter_day), _| *counter_day >= day);
            before - counters.len()
        };
        self.rejections
            .write()
            .await
            .retain(|(_, set_day), _| *set_day >= day);
        Ok(removed_counters)
    }
}

#[async_trait]
impl RejectionRepository for MemoryStore {
    async fn add_rejection(&self, identity_id: Uuid, day: NaiveDate, candidate_id: Uuid) -> DomainResult<()> {
        self.rejections
            .write()
            .await
            .entry((identity_id, day))
            .or_default()
            .insert(candidate_id);
        Ok(())
    }

    async fn rejections(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<HashSet<Uuid>> {
        Ok(self
            .rejections
            .read()
            .await
            .get(&(identity_id, day))
            .cloned()
            .unwrap_or_default())
    }

    async fn clear_rejections(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<()> {
        self.rejections.write().await.remove(&(identity_id, day));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use kd_core::domain::entities::{
        Answer, DisplayAttributes, QuestionCategory, QuestionItem, QuestionKind,
    };
    use kd_core::errors::MatchingError;

    fn identity(email: &str) -> Identity {
        let mut identity = Identity::new(email, "hash", DisplayAttributes::default(), Utc::now());
        identity.verify();
        identity
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[tokio::test]
    async fn test_email_is_unique_ignoring_case() {
        let store = MemoryStore::new();
        store.insert_identity(identity("ada@example.com")).await.unwrap();

        let duplicate = store.insert_identity(identity("ADA@example.com")).await;
        assert!(matches!(duplicate, Err(DomainError::Validation { .. })));

        let found = store.find_by_email("Ada@Example.com").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_record_answers_merges() {
        let store = MemoryStore::new();
        let ada = store.insert_identity(identity("ada@example.com")).await.unwrap();

        store
            .record_answers(ada.id, AnswerSet::new().with("kids", Answer::Bool { value: true }))
            .await
            .unwrap();
        let merged = store
            .record_answers(ada.id, AnswerSet::new().with("pets", Answer::Bool { value: false }))
            .await
            .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(store.answers_for(ada.id).await.unwrap(), merged);

        let missing = store.record_answers(Uuid::new_v4(), AnswerSet::new()).await;
        assert!(matches!(missing, Err(DomainError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_record_answers_checked_against_bank() {
        let bank = QuestionBank::new(vec![QuestionItem {
            id: "kids".to_string(),
            text: "Do you want kids?".to_string(),
            category: QuestionCategory::Relationship,
            kind: QuestionKind::Boolean,
            weight: 5,
        }])
        .unwrap();
        let store = MemoryStore::new().with_question_bank(Arc::new(bank));
        let ada = store.insert_identity(identity("ada@example.com")).await.unwrap();

        let unknown = store
            .record_answers(ada.id, AnswerSet::new().with("pets", Answer::Bool { value: true }))
            .await;
        assert_eq!(
            unknown.unwrap_err(),
            DomainError::Matching(MatchingError::UnknownQuestion { id: "pets".to_string() })
        );

        let wrong_shape = store
            .record_answers(ada.id, AnswerSet::new().with("kids", Answer::Scale { value: 3 }))
            .await;
        assert_eq!(
            wrong_shape.unwrap_err(),
            DomainError::Matching(MatchingError::InvalidAnswer {
                question_id: "kids".to_string()
            })
        );
        assert!(store.answers_for(ada.id).await.unwrap().is_empty());

        store
            .record_answers(ada.id, AnswerSet::new().with("kids", Answer::Bool { value: true }))
            .await
            .unwrap();
        assert_eq!(store.answers_for(ada.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_active_verified_order_and_filter() {
        let store = MemoryStore::new();
        let base = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();

        let mut me = identity("me@example.com");
        me.touch(base);
        let mut stale = identity("stale@example.com");
        stale.touch(base - Duration::hours(5));
        let mut fresh = identity("fresh@example.com");
        fresh.touch(base - Duration::minutes(5));
        let mut gone = identity("gone@example.com");
        gone.deactivate();

        for identity in [me.clone(), stale.clone(), fresh.clone(), gone] {
            store.insert_identity(identity).await.unwrap();
        }

        let ids: Vec<Uuid> = store
            .list_active_verified(me.id)
            .await
            .unwrap()
            .iter()
            .map(|candidate| candidate.id)
            .collect();
        assert_eq!(ids, vec![fresh.id, stale.id]);
    }

    #[tokio::test]
    async fn test_rotate_is_conditional() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let identity_id = Uuid::new_v4();
        let original = RefreshToken::new(identity_id, "h0".to_string(), now, Duration::days(30));
        store.save_refresh_token(original.clone()).await.unwrap();

        let first = original.successor("h1".to_string(), now, Duration::days(30));
        assert!(store.rotate_refresh_token("h0", first, now).await.unwrap());

        let second = original.successor("h2".to_string(), now, Duration::days(30));
        assert!(!store.rotate_refresh_token("h0", second, now).await.unwrap());
        assert!(store.find_refresh_token("h2").await.unwrap().is_none());

        assert!(!store
            .rotate_refresh_token("unknown", original.successor("h3".to_string(), now, Duration::days(30)), now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_quota_counter_and_prune() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();

        assert_eq!(store.try_increment(id, day(1), 1).await.unwrap(), Some(1));
        assert_eq!(store.try_increment(id, day(1), 1).await.unwrap(), None);
        assert_eq!(store.try_increment(id, day(2), 1).await.unwrap(), Some(1));
        store.add_rejection(id, day(1), Uuid::new_v4()).await.unwrap();

        assert_eq!(store.prune_before(day(2)).await.unwrap(), 1);
        assert_eq!(store.count(id, day(1)).await.unwrap(), 0);
        assert_eq!(store.count(id, day(2)).await.unwrap(), 1);
        assert!(store.rejections(id, day(1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejections_are_per_day() {
        let store = MemoryStore::new();
        let id = Uuid::new_v4();
        let candidate = Uuid::new_v4();

        store.add_rejection(id, day(1), candidate).await.unwrap();
        store.add_rejection(id, day(1), candidate).await.unwrap();

        assert_eq!(store.rejections(id, day(1)).await.unwrap().len(), 1);
        assert!(store.rejections(id, day(2)).await.unwrap().is_empty());

        store.clear_rejections(id, day(1)).await.unwrap();
        assert!(store.rejections(id, day(1)).await.unwrap().is_empty());
    }
}
