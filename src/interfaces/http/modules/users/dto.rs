//! User DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError};

use crate::domain::{
    is_email_shaped, Account, CreateAccountDto, IdentifierKind, PublicAccount,
    MAX_PASSWORD_BYTES,
};

/// Create user request
///
/// Email and username must classify as themselves so the account can be
/// looked up by either afterwards.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    #[validate(custom(function = "validate_email_shape"))]
    #[schema(example = "alice@example.com")]
    pub email: String,
    #[validate(
        length(min = 1, max = 64),
        custom(function = "validate_username_shape")
    )]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 1), custom(function = "validate_password_bytes"))]
    pub password: String,
}

fn validate_email_shape(email: &str) -> Result<(), ValidationError> {
    if is_email_shaped(email) {
        Ok(())
    } else {
        Err(ValidationError::new("email").with_message("must be a valid email address".into()))
    }
}

fn validate_username_shape(username: &str) -> Result<(), ValidationError> {
    match IdentifierKind::classify(username) {
        IdentifierKind::Username => Ok(()),
        _ => Err(ValidationError::new("username_shape")
            .with_message("must not look like an email address or an account id".into())),
    }
}

// bcrypt only reads the first 72 bytes
fn validate_password_bytes(password: &str) -> Result<(), ValidationError> {
    if password.len() <= MAX_PASSWORD_BYTES {
        Ok(())
    } else {
        Err(ValidationError::new("password_length")
            .with_message(format!("must be at most {} bytes", MAX_PASSWORD_BYTES).into()))
    }
}

impl From<CreateUserRequest> for CreateAccountDto {
    fn from(r: CreateUserRequest) -> Self {
        Self {
            email: r.email,
            username: r.username,
            password: r.password,
        }
    }
}

/// Public user representation (safe for any caller)
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicUserDto {
    #[schema(example = "507f1f77bcf86cd799439011")]
    pub id: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

impl From<PublicAccount> for PublicUserDto {
    fn from(a: PublicAccount) -> Self {
        Self {
            id: a.id.to_hex(),
            username: a.username,
            created_at: a.created_at,
        }
    }
}

impl From<Account> for PublicUserDto {
    fn from(a: Account) -> Self {
        PublicAccount::from(a).into()
    }
}

/// Private user representation.
///
/// `password` carries the bcrypt digest, never the plaintext.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrivateUserDto {
    pub id: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for PrivateUserDto {
    fn from(a: Account) -> Self {
        Self {
            id: a.id.to_hex(),
            email: a.email,
            username: a.username,
            password_hash: a.password_hash,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}
