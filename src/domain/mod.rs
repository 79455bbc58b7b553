pub mod account;
pub mod error;

pub use account::{
    is_email_shaped, Account, AccountRepository, CreateAccountDto, CredentialHasher,
    IdentifierKind, ObjectId, PublicAccount, MAX_PASSWORD_BYTES,
};
pub use error::{DomainError, DomainResult, ErrorKind};
