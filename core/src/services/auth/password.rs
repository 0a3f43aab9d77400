//! Password verification capability

/// Checks a plaintext password against a stored credential hash
///
/// Hashing mechanics live behind this trait; implementations return `false`
/// for malformed hashes instead of failing.
pub trait PasswordVerifier: Send + Sync {
    fn verify(&self, plaintext: &str, hash: &str) -> bool;
}
