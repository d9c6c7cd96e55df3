//! Admin authentication error types.

use thiserror::Error;

/// Errors that can occur during sign-in and session handling.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email/password pair does not match any operator.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// No session token was presented.
    #[error("missing session token")]
    MissingToken,

    /// Token failed signature, expiry, or shape validation.
    #[error("invalid session token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// Password hashing failed.
    #[error("password hashing failed")]
    PasswordHash,

    /// Token lifetime is out of range.
    #[error("invalid session lifetime")]
    InvalidLifetime,
}
