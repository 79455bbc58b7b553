//! `UserService` RPC implementation

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use tonic::{Request, Response, Status};
use tracing::debug;

use super::proto::user_service_server::UserService;
use super::proto::{CreateUserRequest, IdentifierRequest, PublicUserResponse, UserResponse};
use crate::application::SharedAccountService;
use crate::auth::{AuthError, Caller, SharedAccessVerifier};
use crate::domain::{Account, CreateAccountDto, PublicAccount};

/// Metadata key carrying `Bearer <token>`.
pub const AUTHORIZATION_METADATA: &str = "authorization";

/// gRPC adapter over [`AccountService`](crate::application::AccountService).
///
/// `GetPublicUserByIdentifier` is anonymous; the other methods require a
/// bearer token in the `authorization` metadata.
#[derive(Clone)]
pub struct UserGrpcService {
    accounts: SharedAccountService,
    verifier: SharedAccessVerifier,
}

impl UserGrpcService {
    pub fn new(accounts: SharedAccountService, verifier: SharedAccessVerifier) -> Self {
        Self { accounts, verifier }
    }

    fn authorize<T>(&self, request: &Request<T>) -> Result<Caller, Status> {
        let credential = request
            .metadata()
            .get(AUTHORIZATION_METADATA)
            .ok_or(AuthError::MissingToken)?
            .to_str()
            .map_err(|_| AuthError::InvalidToken)?;

        Ok(self.verifier.verify(credential)?)
    }
}

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

impl From<Account> for UserResponse {
    fn from(a: Account) -> Self {
        Self {
            id: a.id.to_hex(),
            email: a.email,
            username: a.username,
            hash: a.password_hash,
            created_at: timestamp(&a.created_at),
            updated_at: timestamp(&a.updated_at),
        }
    }
}

impl From<PublicAccount> for PublicUserResponse {
    fn from(a: PublicAccount) -> Self {
        Self {
            id: a.id.to_hex(),
            username: a.username,
            created_at: timestamp(&a.created_at),
            // kept on the wire for compatibility; not part of the public projection
            updated_at: String::new(),
        }
    }
}

#[async_trait]
impl UserService for UserGrpcService {
    async fn create_user(
        &self,
        request: Request<CreateUserRequest>,
    ) -> Result<Response<PublicUserResponse>, Status> {
        let caller = self.authorize(&request)?;
        debug!(caller = %caller.subject, "CreateUser");

        let req = request.into_inner();
        let account = self
            .accounts
            .create(CreateAccountDto {
                email: req.email,
                username: req.username,
                password: req.password,
            })
            .await?;

        Ok(Response::new(account.to_public().into()))
    }

    async fn get_private_user_by_identifier(
        &self,
        request: Request<IdentifierRequest>,
    ) -> Result<Response<UserResponse>, Status> {
        let caller = self.authorize(&request)?;
        debug!(caller = %caller.subject, "GetPrivateUserByIdentifier");

        let identifier = request.into_inner().user_identifier;
        let account = self.accounts.find_by_identifier(&identifier).await?;
        Ok(Response::new(account.into()))
    }

    async fn get_public_user_by_identifier(
        &self,
        request: Request<IdentifierRequest>,
    ) -> Result<Response<PublicUserResponse>, Status> {
        let identifier = request.into_inner().user_identifier;
        let account = self.accounts.find_by_identifier(&identifier).await?;
        Ok(Response::new(account.to_public().into()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tonic::Code;

    use super::*;
    use crate::application::AccountService;
    use crate::auth::{create_token, JwtAccessVerifier, JwtConfig};
    use crate::domain::AccountRepository;
    use crate::infrastructure::{BcryptHasher, InMemoryAccountRepository};

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: "grpc-test-secret".to_string(),
            expiration_hours: 1,
            issuer: "bitbridge".to_string(),
        }
    }

    fn service() -> UserGrpcService {
        let repo: Arc<dyn AccountRepository> = Arc::new(InMemoryAccountRepository::new());
        UserGrpcService::new(
            Arc::new(AccountService::new(repo, Arc::new(BcryptHasher::new(4)))),
            Arc::new(JwtAccessVerifier::new(jwt_config())),
        )
    }

    fn authorized<T>(message: T) -> Request<T> {
        let token = create_token("svc", "gateway", &jwt_config()).unwrap();
        let mut request = Request::new(message);
        request.metadata_mut().insert(
            AUTHORIZATION_METADATA,
            format!("Bearer {}", token).parse().unwrap(),
        );
        request
    }

    fn create(email: &str, username: &str) -> CreateUserRequest {
        CreateUserRequest {
            email: email.to_string(),
            username: username.to_string(),
            password: "secret123".to_string(),
        }
    }

    fn identifier(value: &str) -> IdentifierRequest {
        IdentifierRequest {
            user_identifier: value.to_string(),
        }
    }

    #[tokio::test]
    async fn create_requires_token() {
        let status = service()
            .create_user(Request::new(create("a@b.com", "alice")))
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
    }

    #[tokio::test]
    async fn create_then_lookup_every_way() {
        let service = service();
        let created = service
            .create_user(authorized(create("a@b.com", "alice")))
            .await
            .unwrap()
            .into_inner();
        assert_eq!(created.username, "alice");
        assert!(created.updated_at.is_empty());
        assert!(DateTime::parse_from_rfc3339(&created.created_at).is_ok());

        for key in [created.id.as_str(), "a@b.com", "alice"] {
            let public = service
                .get_public_user_by_identifier(Request::new(identifier(key)))
                .await
                .unwrap()
                .into_inner();
            assert_eq!(public, created);

            let private = service
                .get_private_user_by_identifier(authorized(identifier(key)))
                .await
                .unwrap()
                .into_inner();
            assert_eq!(private.id, created.id);
            assert_eq!(private.email, "a@b.com");
            assert!(private.hash.starts_with("$2"));
        }
    }

    #[tokio::test]
    async fn private_lookup_rejects_bad_token() {
        let mut request = Request::new(identifier("alice"));
        request
            .metadata_mut()
            .insert(AUTHORIZATION_METADATA, "Bearer forged".parse().unwrap());

        let status = service()
            .get_private_user_by_identifier(request)
            .await
            .unwrap_err();
        assert_eq!(status.code(), Code::Unauthenticated);
    }

    #[tokio::test]
    async fn errors_carry_matching_codes() {
        let service = service();
        service
            .create_user(authorized(create("a@b.com", "alice")))
            .await
            .unwrap();

        let duplicate = service
            .create_user(authorized(create("a@b.com", "alice")))
            .await
            .unwrap_err();
        assert_eq!(duplicate.code(), Code::AlreadyExists);

        let missing = service
            .get_public_user_by_identifier(Request::new(identifier("nobody")))
            .await
            .unwrap_err();
        assert_eq!(missing.code(), Code::NotFound);

        let empty = service
            .create_user(authorized(create("", "bob")))
            .await
            .unwrap_err();
        assert_eq!(empty.code(), Code::InvalidArgument);
    }
}
