//! Repository traits describing the storage contract.
//!
//! Implementations must make every conditional update (token rotation, quota
//! increment) a single atomic operation.

pub mod identity;
pub mod quota;
pub mod token;

pub use identity::IdentityDirectory;
pub use quota::{QuotaRepository, RejectionRepository};
pub use token::TokenRepository;

#[cfg(test)]
pub use identity::MockIdentityDirectory;
#[cfg(test)]
pub use quota::MockQuotaStore;
#[cfg(test)]
pub use token::MockTokenRepository;
