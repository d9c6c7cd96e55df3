//! Session-related types for admin authentication.
//!
//! Sessions are stateless: the identity travels inside a signed token and
//! is reconstructed from its claims on every request.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use ecom_core::{Email, OperatorId};

use super::operator::Operator;

/// The signed-in operator, as seen by handlers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentAdmin {
    /// Operator ID.
    pub id: OperatorId,
    /// Operator's display name.
    pub name: String,
    /// Operator's email address.
    pub email: Email,
}

impl From<&Operator> for CurrentAdmin {
    fn from(operator: &Operator) -> Self {
        Self {
            id: operator.id.clone(),
            name: operator.name.clone(),
            email: operator.email.clone(),
        }
    }
}

/// Claims embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Operator ID.
    pub sub: OperatorId,
    pub email: Email,
    pub name: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl SessionClaims {
    /// The identity these claims describe.
    #[must_use]
    pub fn admin(&self) -> CurrentAdmin {
        CurrentAdmin {
            id: self.sub.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    /// Expiry as a timestamp.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

/// Session shape returned to clients: `{ user: { id, name, email }, expires }`.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub user: CurrentAdmin,
    pub expires: DateTime<Utc>,
}

impl From<&SessionClaims> for SessionView {
    fn from(claims: &SessionClaims) -> Self {
        Self {
            user: claims.admin(),
            expires: claims.expires_at(),
        }
    }
}
