//! Read-only directory of identities and their questionnaire answers.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{AnswerSet, CandidateRef, Identity};
use crate::errors::DomainResult;

/// Directory read consumed by login and candidate selection
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> DomainResult<Option<Identity>>;

    /// Lookup by login handle; comparison is case-insensitive
    async fn find_by_email(&self, email: &str) -> DomainResult<Option<Identity>>;

    /// Merged answers of an identity; empty when none recorded
    async fn answers_for(&self, identity_id: Uuid) -> DomainResult<AnswerSet>;

    /// Every active, verified identity except `excluding`, most recently active first
    async fn list_active_verified(&self, excluding: Uuid) -> DomainResult<Vec<CandidateRef>>;
}
