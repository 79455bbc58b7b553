//! Password hashing utilities

use bcrypt::{hash, verify, DEFAULT_COST};

use crate::domain::{CredentialHasher, DomainError, DomainResult, MAX_PASSWORD_BYTES};

/// bcrypt-backed [`CredentialHasher`] with a tunable cost factor.
#[derive(Debug, Clone, Copy)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self::new(DEFAULT_COST)
    }
}

impl CredentialHasher for BcryptHasher {
    /// Refuses input bcrypt would silently truncate.
    fn hash(&self, plaintext: &str) -> DomainResult<String> {
        if plaintext.len() > MAX_PASSWORD_BYTES {
            return Err(DomainError::InvalidArgument(format!(
                "password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }
        hash(plaintext, self.cost)
            .map_err(|e| DomainError::Internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, digest: &str, plaintext: &str) -> DomainResult<bool> {
        verify(plaintext, digest)
            .map_err(|e| DomainError::Internal(format!("Failed to verify password: {}", e)))
    }
}
