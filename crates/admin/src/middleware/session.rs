//! Session cookie handling for admin.
//!
//! Sessions are stateless signed tokens. Browsers carry the token in the
//! session cookie; API clients send it as a bearer token. The cookie is
//! `HttpOnly` and `SameSite=Strict`, and `Secure` when served over HTTPS.

use axum::http::{HeaderMap, HeaderValue, header};
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

/// Session cookie name for admin.
pub const SESSION_COOKIE_NAME: &str = "ecom_admin_session";

/// Build the `Set-Cookie` value carrying a session token.
#[must_use]
pub fn session_cookie(token: &str, max_age_seconds: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, token.to_owned()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .secure(secure)
        .max_age(Duration::seconds(max_age_seconds))
        .build()
}

/// Build a `Set-Cookie` value that clears the session cookie.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .secure(secure)
        .max_age(Duration::ZERO)
        .build()
}

/// Render a cookie as a header value.
///
/// Returns `None` if the token contains bytes that are not valid in a
/// header, which signed tokens never do.
#[must_use]
pub fn cookie_header(cookie: &Cookie<'_>) -> Option<HeaderValue> {
    HeaderValue::from_str(&cookie.to_string()).ok()
}

/// Extract the session token from request headers.
///
/// `Authorization: Bearer` takes precedence over the session cookie.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    bearer_token(headers).or_else(|| cookie_token(headers))
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then(|| token.to_owned())
}

fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_owned())
}
