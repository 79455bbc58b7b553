//! Authentication module
//!
//! Verifies bearer tokens issued by the platform's auth service. Only the
//! public-projection lookups are reachable without a verified caller.

pub mod jwt;
pub mod verifier;

pub use jwt::{create_token, verify_token, AuthError, Claims, JwtConfig};
pub use verifier::{extract_bearer, AccessVerifier, Caller, JwtAccessVerifier, SharedAccessVerifier};
