//! HTTP middleware and extractors for admin.
//!
//! # Middleware Order (outermost first, see `crate::app`)
//!
//! 1. Sentry layers (hub per request, HTTP transaction)
//! 2. `TraceLayer` (request span)
//! 3. Request ID (propagate or generate `x-request-id`, recorded on the span)
//! 4. Security headers
//! 5. Body limit
//!
//! The admin gate is not a layer: handlers opt in by taking the
//! [`RequireAdmin`] extractor.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{AdminGateRejection, MaybeSession, RequireAdmin, RequireSession, require_admin};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, clear_session_cookie, session_cookie, token_from_headers};
