use crate::domain::DomainResult;

/// Longest password accepted, in bytes. bcrypt ignores everything past it.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// One-way credential hashing capability.
///
/// `hash` must salt every call, so hashing the same plaintext twice yields
/// different digests. Failures surface as `DomainError::Internal`.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> DomainResult<String>;
    fn verify(&self, digest: &str, plaintext: &str) -> DomainResult<bool>;
}
