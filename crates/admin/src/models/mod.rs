//! Domain models for admin.
//!
//! - `operator` - Configured operators and the admin allowlist
//! - `session` - Session identity carried in signed tokens

pub mod operator;
pub mod session;

pub use operator::{AdminAllowlist, Operator};
pub use session::{CurrentAdmin, SessionClaims, SessionView};
