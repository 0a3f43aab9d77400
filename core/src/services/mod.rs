//! Business services containing domain logic and use cases.

pub mod auth;
pub mod clock;
pub mod matching;
pub mod quota;
pub mod token;

// Re-export commonly used types
pub use auth::{AuthService, PasswordVerifier};
pub use clock::{Clock, ManualClock, SystemClock};
pub use matching::{
    select_high_weight, CandidateSelector, CompatibilityScorer, MatchingOrchestrator,
    OrchestratorConfig, Selection,
};
pub use quota::{QuotaConfig, QuotaTracker};
pub use token::{TokenService, TokenServiceConfig};
