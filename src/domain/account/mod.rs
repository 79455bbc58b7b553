//! Account aggregate
//!
//! Contains the Account entity, its identifier, the identifier classifier,
//! and the ports the account service depends on.

pub mod hasher;
pub mod identifier;
pub mod model;
pub mod object_id;
pub mod repository;

mod dto_create;

pub use hasher::{CredentialHasher, MAX_PASSWORD_BYTES};
pub use identifier::{is_email_shaped, IdentifierKind};
pub use model::{Account, PublicAccount};
pub use object_id::{ObjectId, ObjectIdError};
pub use repository::AccountRepository;

pub use dto_create::CreateAccountDto;
