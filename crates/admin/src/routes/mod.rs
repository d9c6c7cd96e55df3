//! HTTP route handlers for admin.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                 - Liveness
//! GET  /health/ready           - Readiness (product store ping)
//!
//! # Auth
//! POST /auth/credentials       - Sign in with email and password
//! GET  /auth/session           - Current session or null
//! POST /auth/refresh           - Refresh the session token
//! POST /auth/signout           - Clear the session cookie
//!
//! # Products (admin only)
//! GET    /products[?id=]       - One product or all products
//! POST   /products             - Create (JSON or multipart with image files)
//! PUT    /products[?id=]       - Update (JSON or multipart)
//! DELETE /products?id=         - Delete
//!
//! # Media (admin only)
//! POST /upload                 - Upload files, returns hosted links
//! ```

pub mod auth;
pub mod health;
pub mod products;
pub mod upload;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the admin router.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Health
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        // Auth
        .route("/auth/credentials", post(auth::sign_in))
        .route("/auth/session", get(auth::session))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/signout", post(auth::sign_out))
        // Products
        .route("/products", products::router())
        // Media
        .route("/upload", post(upload::upload))
}
