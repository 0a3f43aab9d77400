//! # Kindred Core
//!
//! Core business logic and domain layer for the Kindred backend.
//! This crate contains the session-token lifecycle, the per-tier daily quota
//! tracker, and the candidate selection / compatibility scoring engine, along
//! with the repository traits the storage layer implements.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
