//! Unified error handling for admin.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::media::{MediaError, StagingError};
use crate::services::AuthError;

/// Application-level error type for the admin API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Sign-in or token validation failed.
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Request did not pass the admin gate.
    #[error("Unauthorized")]
    Unauthorized,

    /// Request body could not be decoded.
    #[error("Form parsing error: {0}")]
    Parse(String),

    /// Media host upload failed.
    #[error("Upload error: {0}")]
    Upload(#[from] MediaError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),

    /// Request body type is not supported by the endpoint.
    #[error("Unsupported content type: {0}")]
    UnsupportedMediaType(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("product".to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<StagingError> for AppError {
    fn from(err: StagingError) -> Self {
        match err {
            StagingError::Multipart(e) => Self::Parse(e.to_string()),
            StagingError::Io(e) => Self::Internal(format!("staging upload: {e}")),
        }
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Auth(_) | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Parse(_) | Self::Upload(_) | Self::Database(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Parse(_) | Self::Upload(_) | Self::Database(_) | Self::Internal(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        // Don't expose internal error details to clients
        let body = match &self {
            Self::Auth(AuthError::InvalidCredentials) => json!({"error": "Invalid credentials"}),
            Self::Auth(_) | Self::Unauthorized => json!({"error": "Unauthorized"}),
            Self::Parse(_) => json!({"error": "Form parsing error"}),
            Self::Upload(e) => json!({"error": "Upload error", "details": e.to_string()}),
            Self::Database(_) | Self::Internal(_) => json!({"error": "Internal server error"}),
            Self::NotFound(_) | Self::BadRequest(_) | Self::UnsupportedMediaType(_) => {
                json!({"error": self.to_string()})
            }
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Set the Sentry user context for the signed-in operator.
pub fn set_sentry_user(operator_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(operator_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}
