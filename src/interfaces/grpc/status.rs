//! `DomainError` → `tonic::Status`

use tonic::Status;
use tracing::error;

use crate::auth::AuthError;
use crate::domain::{DomainError, ErrorKind};

impl From<DomainError> for Status {
    fn from(e: DomainError) -> Self {
        match e.kind() {
            ErrorKind::NotFound => Status::not_found(e.to_string()),
            ErrorKind::Conflict => Status::already_exists(e.to_string()),
            ErrorKind::InvalidArgument => Status::invalid_argument(e.to_string()),
            ErrorKind::Unauthorized => Status::unauthenticated(e.to_string()),
            ErrorKind::Internal => {
                error!(error = %e, "RPC failed");
                Status::internal("internal error")
            }
        }
    }
}

impl From<AuthError> for Status {
    fn from(e: AuthError) -> Self {
        Status::unauthenticated(e.to_string())
    }
}
