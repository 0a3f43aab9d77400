//! # Infrastructure Layer
//!
//! Concrete implementations of the storage and security collaborators the
//! Kindred core depends on.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Memory**: a single in-process store implementing every repository trait
//! - **Cache**: Redis quota counters and rejection sets
//! - **Database**: MySQL refresh-token persistence using SQLx
//! - **Security**: bcrypt password verification
//! - **Bootstrap**: environment loading and wiring of the core services

pub mod bootstrap;
pub mod cache;
pub mod database;
pub mod memory;
pub mod retry;
pub mod security;

// Re-export core types for convenience
pub use kd_core::errors::*;

pub use bootstrap::{init_logging, load_config, MemoryServices};
pub use cache::RedisQuotaRepository;
pub use database::{DatabasePool, MySqlTokenRepository};
pub use memory::MemoryStore;
pub use retry::retry_once;
pub use security::BcryptPasswordVerifier;

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// Database connection error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Redis cache error
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Core service construction error
    #[error(transparent)]
    Domain(#[from] DomainError),
}
