//! Caller verification shared by the HTTP and gRPC surfaces

use std::sync::Arc;

use super::jwt::{verify_token, AuthError, JwtConfig};

/// Identity of a verified caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caller {
    pub subject: String,
    pub username: String,
}

/// Decides whether an inbound credential grants private access.
pub trait AccessVerifier: Send + Sync {
    fn verify(&self, credential: &str) -> Result<Caller, AuthError>;
}

pub type SharedAccessVerifier = Arc<dyn AccessVerifier>;

/// Verifies HS256 bearer tokens signed with the shared secret.
#[derive(Clone, Debug)]
pub struct JwtAccessVerifier {
    config: JwtConfig,
}

impl JwtAccessVerifier {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }
}

impl AccessVerifier for JwtAccessVerifier {
    fn verify(&self, credential: &str) -> Result<Caller, AuthError> {
        let token = extract_bearer(credential).ok_or(AuthError::InvalidToken)?;
        let claims = verify_token(token, &self.config)?;
        if claims.is_expired() {
            return Err(AuthError::ExpiredToken);
        }

        Ok(Caller {
            subject: claims.sub,
            username: claims.username,
        })
    }
}

/// Extract token from an `Authorization` value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;

    fn config() -> JwtConfig {
        JwtConfig {
            secret: "verifier-secret".to_string(),
            expiration_hours: 1,
            issuer: "bitbridge".to_string(),
        }
    }

    #[test]
    fn bearer_prefix_is_required() {
        assert_eq!(extract_bearer("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer("Bearer "), None);
        assert_eq!(extract_bearer("Basic abc"), None);
        assert_eq!(extract_bearer("abc"), None);
    }

    #[test]
    fn valid_token_yields_caller() {
        let token = create_token("svc-1", "gateway", &config()).unwrap();
        let verifier = JwtAccessVerifier::new(config());

        let caller = verifier.verify(&format!("Bearer {}", token)).unwrap();
        assert_eq!(caller.subject, "svc-1");
        assert_eq!(caller.username, "gateway");
    }

    #[test]
    fn raw_token_without_scheme_is_rejected() {
        let token = create_token("svc-1", "gateway", &config()).unwrap();
        let verifier = JwtAccessVerifier::new(config());

        assert_eq!(verifier.verify(&token).unwrap_err(), AuthError::InvalidToken);
    }
}
