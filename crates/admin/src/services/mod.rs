//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Operator sign-in, password hashing, session tokens

pub mod auth;

pub use auth::{AuthError, CredentialAuthority, IssuedToken, SessionTokens};
