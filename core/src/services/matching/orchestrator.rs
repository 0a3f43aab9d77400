//! Match resolution state machine

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDate;
use kd_shared::{ExhaustedPolicy, MatchingConfig};
use uuid::Uuid;

use crate::domain::entities::{CandidateRef, Identity, QuestionItem};
use crate::domain::value_objects::{Decision, FailureReason, MatchOutcome, QuotaStatus};
use crate::errors::{DomainError, DomainResult, TokenError};
use crate::repositories::{IdentityDirectory, QuotaRepository, RejectionRepository, TokenRepository};
use crate::services::quota::QuotaTracker;
use crate::services::token::TokenService;

use super::scorer::CompatibilityScorer;
use super::selector::{CandidateSelector, Selection};

/// Configuration for match resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Maximum candidates drawn and scored per resolution
    pub candidate_pool_limit: usize,
    /// Behaviour when every candidate was already passed on today
    pub exhausted_policy: ExhaustedPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            candidate_pool_limit: 50,
            exhausted_policy: ExhaustedPolicy::Report,
        }
    }
}

impl From<&MatchingConfig> for OrchestratorConfig {
    fn from(config: &MatchingConfig) -> Self {
        Self {
            candidate_pool_limit: config.candidate_pool_limit,
            exhausted_policy: config.exhausted_policy,
        }
    }
}

/// Non-terminal states of a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResolvePhase {
    Authenticating,
    QuotaChecking,
    Selecting,
    Scoring,
}

impl fmt::Display for ResolvePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResolvePhase::Authenticating => "authenticating",
            ResolvePhase::QuotaChecking => "quota_checking",
            ResolvePhase::Selecting => "selecting",
            ResolvePhase::Scoring => "scoring",
        };
        f.write_str(name)
    }
}

/// Composes token verification, quota, selection and scoring into one
/// metered "find my match" operation
pub struct MatchingOrchestrator<T, Q, X, D>
where
    T: TokenRepository,
    Q: QuotaRepository,
    X: RejectionRepository,
    D: IdentityDirectory,
{
    tokens: Arc<TokenService<T>>,
    quota: Arc<QuotaTracker<Q>>,
    rejections: Arc<X>,
    directory: Arc<D>,
    selector: CandidateSelector<D>,
    scorer: CompatibilityScorer,
    config: OrchestratorConfig,
}

impl<T, Q, X, D> MatchingOrchestrator<T, Q, X, D>
where
    T: TokenRepository,
    Q: QuotaRepository,
    X: RejectionRepository,
    D: IdentityDirectory,
{
    pub fn new(
        tokens: Arc<TokenService<T>>,
        quota: Arc<QuotaTracker<Q>>,
        rejections: Arc<X>,
        directory: Arc<D>,
        scorer: CompatibilityScorer,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            tokens,
            quota,
            rejections,
            selector: CandidateSelector::new(directory.clone()),
            directory,
            scorer,
            config,
        }
    }

    pub fn scorer(&self) -> &CompatibilityScorer {
        &self.scorer
    }

    /// Resolves one match for the bearer of `access_token`
    ///
    /// Each call that passes authentication spends one unit of the caller's
    /// daily quota, whether or not a candidate is found and whatever the
    /// caller later decides. Storage failures are returned as errors, never
    /// as an empty result.
    ///
    /// # Returns
    ///
    /// * `Resolved` - Top-ranked candidate, its score and the quota left today
    /// * `Denied` - No quota left; carries the next reset instant
    /// * `Exhausted` - No candidate left to show today
    /// * `Failed` - The caller must sign in again
    pub async fn resolve(&self, access_token: &str) -> DomainResult<MatchOutcome> {
        enter(None, ResolvePhase::Authenticating);
        let Some(identity) = self.authenticate(access_token).await? else {
            return Ok(MatchOutcome::Failed {
                reason: FailureReason::Reauthenticate,
            });
        };

        enter(Some(identity.id), ResolvePhase::QuotaChecking);
        let day = self.quota.today();
        let Some(used) = self.quota.consume_on(identity.id, identity.tier, day).await? else {
            return Ok(MatchOutcome::Denied {
                reset_at: self.quota.reset_at_for(day),
            });
        };
        let remaining = self.quota.limit(identity.tier).saturating_sub(used);

        enter(Some(identity.id), ResolvePhase::Selecting);
        let Some(pool) = self.select_pool(identity.id, day).await? else {
            tracing::warn!(identity_id = %identity.id, "No candidates left today");
            return Ok(MatchOutcome::Exhausted);
        };

        enter(Some(identity.id), ResolvePhase::Scoring);
        let answers = self.directory.answers_for(identity.id).await?;
        let Some(best) = self.scorer.best_match(&answers, &pool) else {
            return Ok(MatchOutcome::Exhausted);
        };

        tracing::info!(
            identity_id = %identity.id,
            candidate_id = %best.id,
            score = best.score,
            remaining,
            "Match resolved"
        );
        Ok(MatchOutcome::Resolved {
            candidate_id: best.id,
            score: best.score,
            remaining_quota_today: remaining,
        })
    }

    /// Records the caller's verdict on a resolved candidate
    ///
    /// `Reject` keeps the candidate out of today's pools; `Accept` changes
    /// nothing. Quota is never refunded.
    pub async fn record_decision(
        &self,
        access_token: &str,
        candidate_id: Uuid,
        decision: Decision,
    ) -> DomainResult<()> {
        let identity = self.require_identity(access_token).await?;
        if candidate_id == identity.id {
            return Err(DomainError::Validation {
                message: "Cannot decide on yourself".to_string(),
            });
        }

        match decision {
            Decision::Reject => {
                self.rejections
                    .add_rejection(identity.id, self.quota.today(), candidate_id)
                    .await?;
                tracing::info!(identity_id = %identity.id, candidate_id = %candidate_id, "Candidate rejected");
            }
            Decision::Accept => {
                tracing::info!(identity_id = %identity.id, candidate_id = %candidate_id, "Candidate accepted");
            }
        }
        Ok(())
    }

    /// Today's quota for the caller
    pub async fn quota_status(&self, access_token: &str) -> DomainResult<QuotaStatus> {
        let identity = self.require_identity(access_token).await?;
        self.quota.status(identity.id, identity.tier).await
    }

    /// Clears today's rejection set so passed candidates can show up again
    pub async fn reset_rejections(&self, access_token: &str) -> DomainResult<()> {
        let identity = self.require_identity(access_token).await?;
        self.rejections
            .clear_rejections(identity.id, self.quota.today())
            .await?;
        tracing::info!(identity_id = %identity.id, "Rejection set cleared on request");
        Ok(())
    }

    /// The `count` most decisive questions the caller has not answered
    pub async fn next_questions(&self, access_token: &str, count: usize) -> DomainResult<Vec<QuestionItem>> {
        let identity = self.require_identity(access_token).await?;
        let answers = self.directory.answers_for(identity.id).await?;
        Ok(self.scorer.next_questions(&answers, count))
    }

    /// Verified, matchable caller or `None` when they must sign in again
    async fn authenticate(&self, access_token: &str) -> DomainResult<Option<Identity>> {
        let identity_id = match self.tokens.verify_identity(access_token) {
            Ok(id) => id,
            Err(e) if e.requires_reauthentication() => return Ok(None),
            Err(e) => return Err(e),
        };

        match self.directory.find_by_id(identity_id).await? {
            Some(identity) if identity.can_match() => Ok(Some(identity)),
            Some(_) => {
                tracing::debug!(identity_id = %identity_id, "Caller inactive or unverified");
                Ok(None)
            }
            None => {
                tracing::debug!(identity_id = %identity_id, "Token subject not in directory");
                Ok(None)
            }
        }
    }

    async fn require_identity(&self, access_token: &str) -> DomainResult<Identity> {
        self.authenticate(access_token)
            .await?
            .ok_or_else(|| TokenError::AuthInvalid.into())
    }

    /// Candidate pool for today, applying the exhausted policy
    async fn select_pool(&self, identity_id: Uuid, day: NaiveDate) -> DomainResult<Option<Vec<CandidateRef>>> {
        let limit = self.config.candidate_pool_limit;
        let excluded = self.rejections.rejections(identity_id, day).await?;

        match self.selector.select(identity_id, &excluded, limit).await? {
            Selection::Candidates(pool) => Ok(Some(pool)),
            Selection::Exhausted { passed_over }
                if passed_over > 0 && self.config.exhausted_policy == ExhaustedPolicy::ResetAndRetry =>
            {
                tracing::warn!(
                    identity_id = %identity_id,
                    passed_over,
                    "Pool exhausted, clearing rejections and retrying"
                );
                self.rejections.clear_rejections(identity_id, day).await?;
                match self.selector.select(identity_id, &HashSet::new(), limit).await? {
                    Selection::Candidates(pool) => Ok(Some(pool)),
                    Selection::Exhausted { .. } => Ok(None),
                }
            }
            Selection::Exhausted { .. } => Ok(None),
        }
    }
}

fn enter(identity_id: Option<Uuid>, phase: ResolvePhase) {
    match identity_id {
        Some(id) => tracing::debug!(identity_id = %id, %phase, "Resolve phase"),
        None => tracing::debug!(%phase, "Resolve phase"),
    }
}
