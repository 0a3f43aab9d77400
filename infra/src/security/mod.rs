//! Password hashing

mod bcrypt_verifier;

pub use bcrypt_verifier::BcryptPasswordVerifier;
