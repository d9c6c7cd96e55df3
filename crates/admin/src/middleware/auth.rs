//! Authentication extractors for admin.
//!
//! The admin gate is an extractor: a handler that takes [`RequireAdmin`]
//! cannot run unless the request carried a valid session token whose email
//! is on the admin allowlist.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::session::token_from_headers;
use crate::error::set_sentry_user;
use crate::models::{CurrentAdmin, SessionClaims};
use crate::state::AppState;

/// Why the admin gate rejected a request.
///
/// Every variant renders the same 401 body; the distinction is for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminGateRejection {
    /// No bearer token or session cookie.
    MissingToken,
    /// Token failed signature or expiry validation.
    InvalidToken,
    /// Valid session, but the email is not an admin.
    NotAllowlisted,
}

impl IntoResponse for AdminGateRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Unauthorized"})),
        )
            .into_response()
    }
}

/// Resolve and validate the session token on a request.
fn session_claims(parts: &Parts, state: &AppState) -> Result<SessionClaims, AdminGateRejection> {
    let token = token_from_headers(&parts.headers).ok_or(AdminGateRejection::MissingToken)?;
    state.tokens().verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected session token");
        AdminGateRejection::InvalidToken
    })
}

/// Check that the request belongs to an allowlisted operator.
///
/// # Errors
///
/// Returns `AdminGateRejection` if the token is absent or invalid, or if
/// the session email is not on the allowlist.
pub fn require_admin(parts: &Parts, state: &AppState) -> Result<CurrentAdmin, AdminGateRejection> {
    let claims = session_claims(parts, state)?;

    if !state.allowlist().contains(&claims.email) {
        tracing::warn!(
            operator_id = %claims.sub,
            path = %parts.uri.path(),
            "Session email is not an admin"
        );
        return Err(AdminGateRejection::NotAllowlisted);
    }

    set_sentry_user(claims.sub.as_str(), Some(claims.email.as_str()));
    Ok(claims.admin())
}

/// Extractor that requires an allowlisted admin.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub CurrentAdmin);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AdminGateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        require_admin(parts, state).map(Self)
    }
}

/// Extractor that requires a valid session, admin or not.
///
/// Used by token refresh, which carries an identity forward without
/// granting anything new.
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionClaims);

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = AdminGateRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        session_claims(parts, state).map(Self)
    }
}

/// Extractor that optionally gets the current session.
///
/// Unlike `RequireSession`, this does not reject the request.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionClaims>);

impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(session_claims(parts, state).ok()))
    }
}
