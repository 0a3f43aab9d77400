//! bcrypt-backed password verification

use kd_core::services::PasswordVerifier;

/// Verifies and produces bcrypt password hashes
#[derive(Debug, Clone, Copy)]
pub struct BcryptPasswordVerifier {
    cost: u32,
}

impl Default for BcryptPasswordVerifier {
    fn default() -> Self {
        Self {
            cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl BcryptPasswordVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom work factor; low costs are for tests only
    pub fn with_cost(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password for storage in the credential store
    pub fn hash(&self, plaintext: &str) -> Result<String, bcrypt::BcryptError> {
        bcrypt::hash(plaintext, self.cost)
    }
}

impl PasswordVerifier for BcryptPasswordVerifier {
    fn verify(&self, plaintext: &str, hash: &str) -> bool {
        match bcrypt::verify(plaintext, hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored credential hash is not a valid bcrypt hash");
                false
            }
        }
    }
}
