//! Authentication service module
//!
//! Thin adapter over the token service for login, refresh and logout.

mod password;
mod service;


pub use password::PasswordVerifier;
pub use service::AuthService;
