//! Shared utilities and common types for the Kindred server
//!
//! This crate provides common functionality used across all server modules:
//! - Configuration types
//! - Error response structures and wire error codes
//! - Logging bootstrap

pub mod config;
pub mod errors;
pub mod telemetry;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, DatabaseConfig, Environment, ExhaustedPolicy, JwtConfig,
    LogFormat, LoggingConfig, MatchingConfig, ReusePolicy,
};
pub use errors::{error_codes, ApiResult, ErrorResponse, IntoErrorResponse};
