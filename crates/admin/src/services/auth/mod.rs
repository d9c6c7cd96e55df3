//! Admin authentication service.
//!
//! Operators sign in with email and password. Passwords are checked against
//! Argon2 hashes from the operators file, and a successful sign-in yields a
//! signed, stateless session token (see [`SessionTokens`]).

mod error;
mod operators;
mod tokens;

pub use error::AuthError;
pub use operators::{OperatorFileError, OperatorsFile};
pub use tokens::{IssuedToken, SessionTokens};

use std::collections::HashMap;
use std::sync::OnceLock;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::models::Operator;

/// Validates sign-in attempts against the configured operators.
#[derive(Debug, Clone, Default)]
pub struct CredentialAuthority {
    /// Operators keyed by normalized email.
    operators: HashMap<String, Operator>,
}

impl CredentialAuthority {
    /// Create an authority over the given operators.
    ///
    /// Later entries win if two operators share an email; the operators
    /// file loader rejects that case before it gets here.
    #[must_use]
    pub fn new(operators: impl IntoIterator<Item = Operator>) -> Self {
        Self {
            operators: operators
                .into_iter()
                .map(|op| (op.email.normalized(), op))
                .collect(),
        }
    }

    /// Check an email/password pair.
    ///
    /// Returns the operator on an exact match. Unknown emails and wrong
    /// passwords both return `None`, and both cost one Argon2 verification.
    #[must_use]
    pub fn authorize(&self, email: &str, password: &str) -> Option<Operator> {
        self.authorize_with(email, password, verify_password)
    }

    fn authorize_with(
        &self,
        email: &str,
        password: &str,
        verify: impl Fn(&str, &str) -> Result<(), AuthError>,
    ) -> Option<Operator> {
        let key = email.trim().to_lowercase();
        let Some(operator) = self.operators.get(&key) else {
            // Same hashing work as a known email with a wrong password
            if let Some(hash) = unknown_operator_hash() {
                let _ = verify(password, hash);
            }
            tracing::debug!("Sign-in attempt for unknown operator");
            return None;
        };

        match verify(password, &operator.password_hash) {
            Ok(()) => Some(operator.clone()),
            Err(_) => {
                tracing::debug!(operator_id = %operator.id, "Sign-in attempt with wrong password");
                None
            }
        }
    }

    /// Number of configured operators.
    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Returns true if no operators are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

/// Argon2 hash checked when the email matches no operator. Built on first
/// use with the same parameters as real operator hashes.
fn unknown_operator_hash() -> Option<&'static str> {
    static HASH: OnceLock<Option<String>> = OnceLock::new();
    HASH.get_or_init(|| hash_password("unknown-operator-placeholder").ok())
        .as_deref()
}

/// Hash a password using Argon2id, producing a PHC string.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a PHC hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the hash is malformed or the
/// password does not match.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
