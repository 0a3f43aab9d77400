//! Quota-gated compatibility matching
//!
//! This module handles:
//! - Candidate pool selection from the identity directory
//! - Weighted questionnaire compatibility scoring and ranking
//! - The resolve state machine tying authentication, quota and scoring together

mod orchestrator;
mod scorer;
mod selector;


pub use orchestrator::{MatchingOrchestrator, OrchestratorConfig};
pub use scorer::{select_high_weight, CompatibilityScorer};
pub use selector::{CandidateSelector, Selection};
