//! Identifier classification
//!
//! A caller hands us one opaque string and expects the matching account.
//! Classification is ordered and the first match wins:
//!
//! 1. 24 hex digits → object id
//! 2. structurally valid email address → email
//! 3. anything else → username
//!
//! A string that is both email-shaped and a legal username is treated as an
//! email, and a 24-hex username can only be reached through an explicit
//! username lookup.

use std::fmt;

use validator::ValidateEmail;

use super::ObjectId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    ObjectId,
    Email,
    Username,
}

impl IdentifierKind {
    /// Classify a caller-supplied identifier. Pure, never touches storage.
    pub fn classify(identifier: &str) -> Self {
        if ObjectId::is_valid(identifier) {
            Self::ObjectId
        } else if is_email_shaped(identifier) {
            Self::Email
        } else {
            Self::Username
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ObjectId => "id",
            Self::Email => "email",
            Self::Username => "username",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Local part, a single `@`, and a dotted domain with no empty labels.
pub fn is_email_shaped(value: &str) -> bool {
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return false;
    }

    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return false;
    }

    value.to_owned().validate_email()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reference_inputs() {
        assert_eq!(
            IdentifierKind::classify("507f1f77bcf86cd799439011"),
            IdentifierKind::ObjectId
        );
        assert_eq!(IdentifierKind::classify("a@b.co"), IdentifierKind::Email);
        assert_eq!(
            IdentifierKind::classify("plain_user"),
            IdentifierKind::Username
        );
    }

    #[test]
    fn object_id_shape_wins_over_everything() {
        assert_eq!(
            IdentifierKind::classify("AAAAAAAAAAAAAAAAAAAAAAAA"),
            IdentifierKind::ObjectId
        );
        // one digit short falls through to username
        assert_eq!(
            IdentifierKind::classify("507f1f77bcf86cd79943901"),
            IdentifierKind::Username
        );
    }

    #[test]
    fn email_requires_dotted_domain() {
        assert_eq!(IdentifierKind::classify("alice@localhost"), IdentifierKind::Username);
        assert_eq!(IdentifierKind::classify("alice@example."), IdentifierKind::Username);
        assert_eq!(IdentifierKind::classify("@example.com"), IdentifierKind::Username);
        assert_eq!(IdentifierKind::classify("a@b@c.com"), IdentifierKind::Username);
        assert_eq!(IdentifierKind::classify("a b@c.com"), IdentifierKind::Username);
        assert_eq!(
            IdentifierKind::classify("first.last+tag@mail.example.org"),
            IdentifierKind::Email
        );
    }

    #[test]
    fn classification_is_total() {
        for input in ["", "@", "....", "ünïcödé", "507f1f77bcf86cd7994390zz"] {
            assert_eq!(IdentifierKind::classify(input), IdentifierKind::Username);
        }
    }
}
