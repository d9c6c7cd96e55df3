//! Sign-in and session routes.
//!
//! ```text
//! POST /auth/credentials   - Email/password sign-in, issues a session token
//! GET  /auth/session       - Current session, or null
//! POST /auth/refresh       - Re-issue the current token with a fresh expiry
//! POST /auth/signout       - Clear the session cookie
//! ```

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::{HeaderMap, header},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::instrument;

use crate::error::{AppError, clear_sentry_user};
use crate::middleware::{MaybeSession, RequireSession, clear_session_cookie, session_cookie};
use crate::middleware::session::cookie_header;
use crate::models::{CurrentAdmin, SessionView};
use crate::services::{AuthError, IssuedToken};
use crate::state::AppState;

/// Sign-in body, accepted as JSON or as a URL-encoded form.
#[derive(Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

impl FromRequest<AppState> for Credentials {
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("application/json"));

        if is_json {
            Json::<Self>::from_request(req, state)
                .await
                .map(|Json(c)| c)
                .map_err(|e| AppError::BadRequest(e.body_text()))
        } else {
            Form::<Self>::from_request(req, state)
                .await
                .map(|Form(c)| c)
                .map_err(|e| AppError::BadRequest(e.body_text()))
        }
    }
}

/// A token plus the session it describes.
#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub token: String,
    pub session: SessionView,
}

/// Respond with a fresh token in the body and in the session cookie.
fn token_response(state: &AppState, issued: &IssuedToken) -> Response {
    let max_age = state.tokens().ttl().num_seconds();
    let cookie = session_cookie(&issued.token, max_age, state.secure_cookies());

    let mut headers = HeaderMap::new();
    if let Some(value) = cookie_header(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }

    let body = SignInResponse {
        token: issued.token.clone(),
        session: SessionView::from(&issued.claims),
    };
    (headers, Json(body)).into_response()
}

/// `POST /auth/credentials`.
///
/// Wrong email and wrong password get the same 401; there is no redirect.
#[instrument(skip(state, credentials), fields(email = %credentials.email))]
pub async fn sign_in(
    State(state): State<AppState>,
    credentials: Credentials,
) -> Result<Response, AppError> {
    let operator = state
        .credentials()
        .authorize(&credentials.email, &credentials.password)
        .ok_or_else(|| {
            tracing::warn!("Failed sign-in attempt");
            AuthError::InvalidCredentials
        })?;

    let issued = state.tokens().issue(&CurrentAdmin::from(&operator))?;
    tracing::info!(operator_id = %operator.id, "Operator signed in");
    Ok(token_response(&state, &issued))
}

/// `GET /auth/session` returns the session or JSON `null`, never 401.
pub async fn session(MaybeSession(claims): MaybeSession) -> Json<Option<SessionView>> {
    Json(claims.as_ref().map(SessionView::from))
}

/// `POST /auth/refresh` re-issues the presented token.
#[instrument(skip(state, claims), fields(operator_id = %claims.sub))]
pub async fn refresh(
    State(state): State<AppState>,
    RequireSession(claims): RequireSession,
) -> Result<Response, AppError> {
    let issued = state.tokens().refresh(&claims)?;
    Ok(token_response(&state, &issued))
}

/// `POST /auth/signout` clears the session cookie.
///
/// Tokens are stateless, so a copied token stays valid until it expires.
pub async fn sign_out(State(state): State<AppState>) -> Response {
    clear_sentry_user();
    let mut headers = HeaderMap::new();
    if let Some(value) = cookie_header(&clear_session_cookie(state.secure_cookies())) {
        headers.insert(header::SET_COOKIE, value);
    }
    (headers, Json(json!({"ok": true}))).into_response()
}
