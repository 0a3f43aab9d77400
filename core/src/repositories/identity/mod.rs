#[path = "trait.rs"]
mod repository_trait;

pub use repository_trait::IdentityDirectory;

#[cfg(test)]
pub mod mock;
#[cfg(test)]
pub use mock::MockIdentityDirectory;
