//! Candidate references produced by the directory and consumed by scoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::AnswerSet;

/// A matchable identity together with the answers needed to score it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRef {
    pub id: Uuid,
    pub answers: AnswerSet,
    pub last_active_at: DateTime<Utc>,
}

/// Candidate id paired with its compatibility score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub id: Uuid,
    pub score: f64,
}

impl ScoredCandidate {
    pub fn new(id: Uuid, score: f64) -> Self {
        Self { id, score }
    }
}
