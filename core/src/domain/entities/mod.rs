//! Domain entities representing core business objects.

pub mod candidate;
pub mod identity;
pub mod question;
pub mod token;

// Re-export commonly used types
pub use candidate::{CandidateRef, ScoredCandidate};
pub use identity::{DisplayAttributes, EntitlementTier, Identity};
pub use question::{Answer, AnswerSet, QuestionBank, QuestionCategory, QuestionItem, QuestionKind, QuestionOption};
pub use token::{Claims, RefreshToken, TokenPair};
