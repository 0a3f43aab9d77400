#[path = "trait.rs"]
mod repository_trait;

pub use repository_trait::{QuotaRepository, RejectionRepository};

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use mock::MockQuotaStore;
