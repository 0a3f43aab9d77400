//! Candidate pool selection

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use crate::domain::entities::CandidateRef;
use crate::errors::{DomainError, DomainResult};
use crate::repositories::IdentityDirectory;

/// Result of a pool selection
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    /// Eligible candidates, most recently active first
    Candidates(Vec<CandidateRef>),
    /// Nobody left; `passed_over` counts candidates hidden only by the exclusion set
    Exhausted { passed_over: usize },
}

impl Selection {
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Selection::Exhausted { .. })
    }
}

/// Draws eligible candidates from the identity directory
pub struct CandidateSelector<D: IdentityDirectory> {
    directory: Arc<D>,
}

impl<D: IdentityDirectory> CandidateSelector<D> {
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Selects up to `limit` active, verified candidates for `identity_id`
    ///
    /// The caller and every id in `exclude` are left out. Directory order
    /// (recency) is preserved; ranking happens later in scoring.
    ///
    /// # Returns
    ///
    /// * `Ok(Selection::Candidates)` - At least one candidate
    /// * `Ok(Selection::Exhausted)` - The filtered pool is empty
    /// * `Err(DomainError::Validation)` - `limit` is zero
    pub async fn select(
        &self,
        identity_id: Uuid,
        exclude: &HashSet<Uuid>,
        limit: usize,
    ) -> DomainResult<Selection> {
        if limit == 0 {
            return Err(DomainError::Validation {
                message: "Candidate limit must be positive".to_string(),
            });
        }

        let pool = self.directory.list_active_verified(identity_id).await?;
        let pool_size = pool.len();

        let mut passed_over = 0;
        let candidates: Vec<CandidateRef> = pool
            .into_iter()
            .filter(|candidate| candidate.id != identity_id)
            .filter(|candidate| {
                let excluded = exclude.contains(&candidate.id);
                if excluded {
                    passed_over += 1;
                }
                !excluded
            })
            .take(limit)
            .collect();

        tracing::debug!(
            identity_id = %identity_id,
            pool_size,
            selected = candidates.len(),
            excluded = exclude.len(),
            "Selected candidate pool"
        );

        if candidates.is_empty() {
            return Ok(Selection::Exhausted { passed_over });
        }
        Ok(Selection::Candidates(candidates))
    }
}
