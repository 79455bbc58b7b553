//! In-memory account storage

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::domain::{Account, AccountRepository, DomainError, DomainResult, ObjectId};

/// In-memory storage for development and testing.
///
/// Mirrors the database's unique indexes with two secondary maps, so a
/// duplicate `email` or `username` is reported as a conflict exactly like
/// the SQL backend does.
#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: DashMap<ObjectId, Account>,
    by_email: DashMap<String, ObjectId>,
    by_username: DashMap<String, ObjectId>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    fn conflict() -> DomainError {
        DomainError::Conflict("account already exists".to_string())
    }

    fn lookup(&self, id: Option<ObjectId>, field: &'static str, value: &str) -> DomainResult<Account> {
        id.and_then(|id| self.accounts.get(&id).map(|a| a.value().clone()))
            .ok_or_else(|| DomainError::account_not_found(field, value))
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn insert(&self, account: &Account) -> DomainResult<()> {
        if self.accounts.contains_key(&account.id) {
            return Err(Self::conflict());
        }

        match self.by_email.entry(account.email.clone()) {
            Entry::Occupied(_) => return Err(Self::conflict()),
            Entry::Vacant(slot) => {
                slot.insert(account.id);
            }
        }

        match self.by_username.entry(account.username.clone()) {
            Entry::Occupied(_) => {
                self.by_email.remove(&account.email);
                return Err(Self::conflict());
            }
            Entry::Vacant(slot) => {
                slot.insert(account.id);
            }
        }

        self.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn replace(&self, account: &Account) -> DomainResult<Account> {
        let Some(mut stored) = self.accounts.get_mut(&account.id) else {
            return Err(DomainError::account_not_found("id", account.id.to_hex()));
        };

        let email_taken = self
            .by_email
            .get(&account.email)
            .is_some_and(|owner| *owner != account.id);
        let username_taken = self
            .by_username
            .get(&account.username)
            .is_some_and(|owner| *owner != account.id);
        if email_taken || username_taken {
            return Err(Self::conflict());
        }

        if stored.email != account.email {
            self.by_email.remove(&stored.email);
            self.by_email.insert(account.email.clone(), account.id);
        }
        if stored.username != account.username {
            self.by_username.remove(&stored.username);
            self.by_username.insert(account.username.clone(), account.id);
        }

        let mut updated = account.clone();
        updated.updated_at = Utc::now();
        *stored = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &ObjectId) -> DomainResult<()> {
        let Some((_, removed)) = self.accounts.remove(id) else {
            return Err(DomainError::account_not_found("id", id.to_hex()));
        };
        self.by_email.remove(&removed.email);
        self.by_username.remove(&removed.username);
        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> DomainResult<Account> {
        self.lookup(Some(*id), "id", &id.to_hex())
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Account> {
        let id = self.by_email.get(email).map(|id| *id);
        self.lookup(id, "email", email)
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Account> {
        let id = self.by_username.get(username).map(|id| *id);
        self.lookup(id, "username", username)
    }
}
