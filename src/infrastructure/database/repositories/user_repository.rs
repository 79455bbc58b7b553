use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr,
};
use tracing::debug;

use crate::domain::{Account, AccountRepository, DomainError, DomainResult, ObjectId};
use crate::infrastructure::database::entities::user;

pub struct SeaOrmAccountRepository {
    db: DatabaseConnection,
}

impl SeaOrmAccountRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn user_model_to_domain(model: user::Model) -> DomainResult<Account> {
    let id = ObjectId::parse_str(&model.id).map_err(|e| {
        DomainError::Internal(format!("Stored account has a corrupt id '{}': {}", model.id, e))
    })?;

    Ok(Account {
        id,
        email: model.email,
        username: model.username,
        password_hash: model.password_hash,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn domain_to_active_model(account: &Account) -> user::ActiveModel {
    user::ActiveModel {
        id: Set(account.id.to_hex()),
        email: Set(account.email.clone()),
        username: Set(account.username.clone()),
        password_hash: Set(account.password_hash.clone()),
        created_at: Set(account.created_at),
        updated_at: Set(account.updated_at),
    }
}

fn db_err(e: DbErr) -> DomainError {
    DomainError::Internal(format!("Database error: {}", e))
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn write_err(e: DbErr, id: &ObjectId) -> DomainError {
    if is_unique_violation(&e) {
        return DomainError::Conflict("account already exists".to_string());
    }
    match e {
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => {
            DomainError::account_not_found("id", id.to_hex())
        }
        other => db_err(other),
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl AccountRepository for SeaOrmAccountRepository {
    async fn insert(&self, account: &Account) -> DomainResult<()> {
        domain_to_active_model(account)
            .insert(&self.db)
            .await
            .map_err(|e| write_err(e, &account.id))?;

        debug!(account_id = %account.id, "Account row inserted");
        Ok(())
    }

    async fn replace(&self, account: &Account) -> DomainResult<Account> {
        let mut active = domain_to_active_model(account);
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&self.db)
            .await
            .map_err(|e| write_err(e, &account.id))?;

        user_model_to_domain(updated)
    }

    async fn delete(&self, id: &ObjectId) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id.to_hex())
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::account_not_found("id", id.to_hex()));
        }

        Ok(())
    }

    async fn find_by_id(&self, id: &ObjectId) -> DomainResult<Account> {
        let model = user::Entity::find_by_id(id.to_hex())
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::account_not_found("id", id.to_hex()))?;

        user_model_to_domain(model)
    }

    async fn find_by_email(&self, email: &str) -> DomainResult<Account> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::account_not_found("email", email))?;

        user_model_to_domain(model)
    }

    async fn find_by_username(&self, username: &str) -> DomainResult<Account> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .ok_or_else(|| DomainError::account_not_found("username", username))?;

        user_model_to_domain(model)
    }
}
