//! Account service: application-layer orchestration
//!
//! Creation and lookup of accounts live here. Both the HTTP and the gRPC
//! handlers are thin wrappers that delegate to this service, so a lookup
//! behaves the same whichever transport carried it.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::domain::{
    is_email_shaped, Account, AccountRepository, CreateAccountDto, CredentialHasher,
    DomainError, DomainResult, IdentifierKind, ObjectId, MAX_PASSWORD_BYTES,
};

/// Account service: orchestrates hashing, id assignment and lookups.
///
/// Generic over `R: AccountRepository` so it stays decoupled from the
/// concrete persistence layer; `R` may be `dyn AccountRepository` when the
/// backend is picked at runtime (see [`SharedAccountService`]).
///
/// Holds no per-request state; every operation issues at most one
/// persistence call and nothing is retried here.
pub struct AccountService<R: AccountRepository + ?Sized> {
    repo: Arc<R>,
    hasher: Arc<dyn CredentialHasher>,
}

/// Service over a runtime-selected repository, as used by the transports.
pub type SharedAccountService = Arc<AccountService<dyn AccountRepository>>;

impl<R: AccountRepository + ?Sized> Clone for AccountService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: Arc::clone(&self.repo),
            hasher: Arc::clone(&self.hasher),
        }
    }
}

impl<R: AccountRepository + ?Sized> AccountService<R> {
    pub fn new(repo: Arc<R>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { repo, hasher }
    }

    // ── Creation ────────────────────────────────────────────────

    /// Create a new account and return its full (private) representation.
    ///
    /// The email and username must classify as themselves, otherwise
    /// `find_by_identifier` could never reach the new account.
    ///
    /// Fails with `Conflict` when the email or username is taken and with
    /// `Internal` when the password cannot be hashed.
    pub async fn create(&self, dto: CreateAccountDto) -> DomainResult<Account> {
        if dto.email.trim().is_empty() {
            return Err(DomainError::InvalidArgument("email must not be empty".into()));
        }
        if dto.username.trim().is_empty() {
            return Err(DomainError::InvalidArgument("username must not be empty".into()));
        }
        if dto.password.is_empty() {
            return Err(DomainError::InvalidArgument("password must not be empty".into()));
        }
        if !is_email_shaped(&dto.email) {
            return Err(DomainError::InvalidArgument(format!(
                "'{}' is not a valid email address",
                dto.email
            )));
        }
        if IdentifierKind::classify(&dto.username) != IdentifierKind::Username {
            return Err(DomainError::InvalidArgument(
                "username must not look like an email address or an account id".into(),
            ));
        }
        if dto.password.len() > MAX_PASSWORD_BYTES {
            return Err(DomainError::InvalidArgument(format!(
                "password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        let password_hash = self.hash_password(dto.password).await?;

        let now = Utc::now();
        let account = Account {
            id: ObjectId::new(),
            email: dto.email,
            username: dto.username,
            password_hash,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.repo.insert(&account).await {
            if matches!(e, DomainError::Conflict(_)) {
                warn!(username = %account.username, "Account creation rejected: already exists");
                return Err(DomainError::Conflict("account already exists".into()));
            }
            return Err(e);
        }

        metrics::counter!("accounts_created_total").increment(1);
        info!(account_id = %account.id, username = %account.username, "Account created");
        Ok(account)
    }

    /// bcrypt is deliberately slow, so it runs on the blocking pool.
    ///
    /// Dropping the returned future abandons the wait but not the hash job.
    async fn hash_password(&self, password: String) -> DomainResult<String> {
        let hasher = Arc::clone(&self.hasher);
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| DomainError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    // ── Queries ─────────────────────────────────────────────────

    /// Get an account by its object id. Malformed ids never reach storage.
    pub async fn find_by_id(&self, id: &str) -> DomainResult<Account> {
        let object_id = ObjectId::parse_str(id)
            .map_err(|e| DomainError::InvalidArgument(format!("invalid account id '{}': {}", id, e)))?;
        self.repo.find_by_id(&object_id).await
    }

    pub async fn find_by_email(&self, email: &str) -> DomainResult<Account> {
        self.repo.find_by_email(email).await
    }

    pub async fn find_by_username(&self, username: &str) -> DomainResult<Account> {
        self.repo.find_by_username(username).await
    }

    /// Resolve an opaque identifier (object id, email or username).
    ///
    /// The matching lookup's result or error is returned unchanged.
    pub async fn find_by_identifier(&self, identifier: &str) -> DomainResult<Account> {
        let kind = IdentifierKind::classify(identifier);
        debug!(%kind, "Resolving account identifier");
        metrics::counter!("account_lookups_total", "kind" => kind.as_str()).increment(1);

        match kind {
            IdentifierKind::ObjectId => self.find_by_id(identifier).await,
            IdentifierKind::Email => self.find_by_email(identifier).await,
            IdentifierKind::Username => self.find_by_username(identifier).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::crypto::BcryptHasher;
    use crate::infrastructure::storage::InMemoryAccountRepository;

    struct FailingHasher;

    impl CredentialHasher for FailingHasher {
        fn hash(&self, _plaintext: &str) -> DomainResult<String> {
            Err(DomainError::Internal("out of memory".into()))
        }

        fn verify(&self, _digest: &str, _plaintext: &str) -> DomainResult<bool> {
            Ok(false)
        }
    }

    fn service() -> AccountService<InMemoryAccountRepository> {
        AccountService::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(BcryptHasher::new(4)),
        )
    }

    fn dto(email: &str, username: &str, password: &str) -> CreateAccountDto {
        CreateAccountDto {
            email: email.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn create_hashes_password_and_assigns_id() {
        let service = service();
        let account = service.create(dto("a@b.com", "alice", "secret123")).await.unwrap();

        assert!(ObjectId::is_valid(&account.id.to_hex()));
        assert_ne!(account.password_hash, "secret123");
        assert!(BcryptHasher::new(4)
            .verify(&account.password_hash, "secret123")
            .unwrap());
        assert_eq!(account.created_at, account.updated_at);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email_and_username() {
        let service = service();
        service.create(dto("a@b.com", "alice", "secret123")).await.unwrap();

        let same_email = service.create(dto("a@b.com", "bob", "secret123")).await;
        assert!(matches!(same_email, Err(DomainError::Conflict(ref m)) if m == "account already exists"));

        let same_username = service.create(dto("c@d.com", "alice", "secret123")).await;
        assert!(matches!(same_username, Err(DomainError::Conflict(_))));
    }

    #[tokio::test]
    async fn create_rejects_blank_fields_before_hashing() {
        let service = AccountService::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(FailingHasher),
        );

        for input in [dto("", "alice", "pw"), dto("a@b.com", " ", "pw"), dto("a@b.com", "alice", "")] {
            assert!(matches!(
                service.create(input).await,
                Err(DomainError::InvalidArgument(_))
            ));
        }
    }

    #[tokio::test]
    async fn hashing_failure_is_internal_and_persists_nothing() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let service = AccountService::new(Arc::clone(&repo), Arc::new(FailingHasher));

        let err = service.create(dto("a@b.com", "alice", "secret123")).await.unwrap_err();
        assert!(matches!(err, DomainError::Internal(_)));
        assert!(repo.is_empty());
    }

    struct SlowHasher;

    impl CredentialHasher for SlowHasher {
        fn hash(&self, plaintext: &str) -> DomainResult<String> {
            std::thread::sleep(std::time::Duration::from_millis(200));
            Ok(format!("slow:{}", plaintext))
        }

        fn verify(&self, digest: &str, plaintext: &str) -> DomainResult<bool> {
            Ok(digest == format!("slow:{}", plaintext))
        }
    }

    #[tokio::test]
    async fn cancelled_create_persists_nothing() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let service = AccountService::new(Arc::clone(&repo), Arc::new(SlowHasher));

        let pending = tokio::spawn({
            let service = service.clone();
            async move { service.create(dto("a@b.com", "alice", "secret123")).await }
        });
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        pending.abort();
        assert!(pending.await.unwrap_err().is_cancelled());

        // outlive the detached hash job
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn malformed_id_is_invalid_argument() {
        let err = service().find_by_id("not-an-id").await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unknown_values_are_not_found() {
        let service = service();

        assert!(matches!(
            service.find_by_id("507f1f77bcf86cd799439011").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.find_by_email("nobody@example.com").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            service.find_by_username("nobody").await,
            Err(DomainError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn identifier_resolves_every_key_to_the_same_account() {
        let service = service();
        let created = service.create(dto("a@b.com", "alice", "secret123")).await.unwrap();

        for identifier in [created.id.to_hex(), "a@b.com".to_string(), "alice".to_string()] {
            let found = service.find_by_identifier(&identifier).await.unwrap();
            assert_eq!(found, created);
        }
    }

    #[tokio::test]
    async fn create_rejects_emails_the_resolver_cannot_classify() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let service = AccountService::new(Arc::clone(&repo), Arc::new(BcryptHasher::new(4)));

        for email in ["alice@localhost", "alice@[IPv6:::1]", "alice@example."] {
            assert!(matches!(
                service.create(dto(email, "alice", "secret123")).await,
                Err(DomainError::InvalidArgument(_))
            ));
        }
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_usernames_shaped_like_other_keys() {
        let repo = Arc::new(InMemoryAccountRepository::new());
        let service = AccountService::new(Arc::clone(&repo), Arc::new(BcryptHasher::new(4)));

        for username in ["bob@home.net", "507f1f77bcf86cd799439011"] {
            assert!(matches!(
                service.create(dto("x@y.com", username, "secret123")).await,
                Err(DomainError::InvalidArgument(_))
            ));
        }
        assert!(repo.is_empty());
    }

    #[tokio::test]
    async fn create_rejects_passwords_bcrypt_would_truncate() {
        let service = AccountService::new(
            Arc::new(InMemoryAccountRepository::new()),
            Arc::new(FailingHasher),
        );
        let long = "a".repeat(MAX_PASSWORD_BYTES + 1);

        assert!(matches!(
            service.create(dto("a@b.com", "alice", &long)).await,
            Err(DomainError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn password_at_the_byte_limit_is_accepted() {
        let service = service();
        let password = "a".repeat(MAX_PASSWORD_BYTES);
        let account = service.create(dto("a@b.com", "alice", &password)).await.unwrap();

        assert!(BcryptHasher::new(4)
            .verify(&account.password_hash, &password)
            .unwrap());
    }

    #[tokio::test]
    async fn accepted_accounts_resolve_by_every_key() {
        let service = service();
        let created = service
            .create(dto("first.last+tag@mail.example.org", "first_last", "secret123"))
            .await
            .unwrap();

        for identifier in [
            created.id.to_hex(),
            created.email.clone(),
            created.username.clone(),
        ] {
            assert_eq!(service.find_by_identifier(&identifier).await.unwrap(), created);
        }
    }
}
