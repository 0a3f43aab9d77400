#[path = "trait.rs"]
mod repository_trait;

pub use repository_trait::TokenRepository;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use mock::MockTokenRepository;
