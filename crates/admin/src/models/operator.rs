//! Operator domain types.
//!
//! Operators are the people allowed to sign in. The admin allowlist is the
//! subset of operator emails permitted through the admin gate.

use std::collections::HashSet;

use serde::Deserialize;

use ecom_core::{Email, OperatorId};

/// An operator credential entry (domain type).
#[derive(Clone, Deserialize)]
pub struct Operator {
    /// Stable operator identifier, carried in session tokens.
    pub id: OperatorId,
    /// Display name.
    pub name: String,
    /// Sign-in email address.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Email addresses authorized to use the admin endpoints.
///
/// Loaded once at startup; membership is case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowlist {
    emails: HashSet<String>,
}

impl AdminAllowlist {
    /// Build an allowlist from a set of emails.
    pub fn new<'a>(emails: impl IntoIterator<Item = &'a Email>) -> Self {
        Self {
            emails: emails.into_iter().map(Email::normalized).collect(),
        }
    }

    /// Returns true if the email may pass the admin gate.
    #[must_use]
    pub fn contains(&self, email: &Email) -> bool {
        self.emails.contains(&email.normalized())
    }

    /// Number of distinct allowlisted emails.
    #[must_use]
    pub fn len(&self) -> usize {
        self.emails.len()
    }

    /// Returns true if nobody is allowlisted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}
