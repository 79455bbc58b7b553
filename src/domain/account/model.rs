use chrono::{DateTime, Utc};

use super::ObjectId;

/// Full account record (private projection).
///
/// Only callers holding a verified access capability may see this shape;
/// everyone else gets a [`PublicAccount`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: ObjectId,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn to_public(&self) -> PublicAccount {
        PublicAccount {
            id: self.id,
            username: self.username.clone(),
            created_at: self.created_at,
        }
    }
}

/// Subset of an account that is safe to disclose to any caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicAccount {
    pub id: ObjectId,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<Account> for PublicAccount {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            created_at: account.created_at,
        }
    }
}
