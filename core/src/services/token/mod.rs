//! Token service module for session credentials
//!
//! This module handles:
//! - JWT access token issuance and verification
//! - Refresh token issuance, rotation-on-use and reuse detection
//! - Refresh token revocation and cleanup

mod config;
mod service;


pub use config::TokenServiceConfig;
pub use service::TokenService;
