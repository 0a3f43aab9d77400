//! Mock identity directory for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::domain::entities::{AnswerSet, CandidateRef, Identity};
use crate::errors::DomainResult;

use super::IdentityDirectory;

#[derive(Clone, Default)]
pub struct MockIdentityDirectory {
    pub identities: Arc<Mutex<Vec<Identity>>>,
    pub answers: Arc<Mutex<HashMap<Uuid, AnswerSet>>>,
}

impl MockIdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, identity: Identity, answers: AnswerSet) {
        let mut identities = self.identities.lock().unwrap();
        self.answers.lock().unwrap().insert(identity.id, answers);
        identities.push(identity);
    }
}

#[async_trait]
impl IdentityDirectory for MockIdentityDirectory {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Identity>> {
        let identities = self.identities.lock().unwrap();
        Ok(identities.iter().find(|i| i.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Identity>> {
        let identities = self.identities.lock().unwrap();
        Ok(identities
            .iter()
            .find(|i| i.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn answers_for(&self, identity_id: Uuid) -> DomainResult<AnswerSet> {
        let answers = self.answers.lock().unwrap();
        Ok(answers.get(&identity_id).cloned().unwrap_or_default())
    }

    async fn list_active_verified(&self, excluding: Uuid) -> DomainResult<Vec<CandidateRef>> {
        let identities = self.identities.lock().unwrap();
        let answers = self.answers.lock().unwrap();
        let mut candidates: Vec<CandidateRef> = identities
            .iter()
            .filter(|i| i.id != excluding && i.can_match())
            .map(|i| CandidateRef {
                id: i.id,
                answers: answers.get(&i.id).cloned().unwrap_or_default(),
                last_active_at: i.last_active_at,
            })
            .collect();
        candidates.sort_by(|a, b| b.last_active_at.cmp(&a.last_active_at));
        Ok(candidates)
    }
}
