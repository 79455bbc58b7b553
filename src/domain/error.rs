use thiserror::Error;

/// Broad classification of a [`DomainError`], used by transport adapters
/// to pick a wire status without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidArgument,
    Unauthorized,
    Internal,
}

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn account_not_found(field: &'static str, value: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "Account",
            field,
            value: value.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }
}

/// Result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_follows_variant() {
        assert_eq!(
            DomainError::account_not_found("email", "a@b.co").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            DomainError::Conflict("account already exists".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            DomainError::InvalidArgument("bad id".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            DomainError::Internal("boom".into()).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn not_found_message_names_the_lookup() {
        let err = DomainError::account_not_found("username", "alice");
        assert_eq!(err.to_string(), "Not found: Account with username=alice");
    }
}
