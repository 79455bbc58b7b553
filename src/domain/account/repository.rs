use async_trait::async_trait;

use super::{Account, ObjectId};
use crate::domain::DomainResult;

/// Persistence port for accounts.
///
/// Implementations translate their own failures into the domain taxonomy:
/// a missing record is `DomainError::NotFound`, a unique-constraint
/// violation on `email` or `username` is `DomainError::Conflict`, anything
/// else is `DomainError::Internal`. Uniqueness itself is enforced by the
/// backing store, not by callers.
#[async_trait]
pub trait AccountRepository: Send + Sync {
    async fn insert(&self, account: &Account) -> DomainResult<()>;
    async fn replace(&self, account: &Account) -> DomainResult<Account>;
    async fn delete(&self, id: &ObjectId) -> DomainResult<()>;

    async fn find_by_id(&self, id: &ObjectId) -> DomainResult<Account>;
    async fn find_by_email(&self, email: &str) -> DomainResult<Account>;
    async fn find_by_username(&self, username: &str) -> DomainResult<Account>;
}
