//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::AdminConfig;
use crate::db::{PgProductStore, ProductStore, create_pool};
use crate::media::{CloudinaryClient, MediaError, MediaUploader, UploadStaging};
use crate::models::AdminAllowlist;
use crate::services::auth::{OperatorFileError, OperatorsFile};
use crate::services::{AuthError, CredentialAuthority, SessionTokens};

/// Error building application state at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("database connection failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("media client: {0}")]
    Media(#[from] MediaError),
    #[error("operators file: {0}")]
    Operators(#[from] OperatorFileError),
    #[error("session tokens: {0}")]
    Tokens(#[from] AuthError),
}

/// Everything the handlers depend on, assembled by the caller.
///
/// Production code goes through [`AppState::from_config`]; tests fill this
/// in with an in-memory store and a fake uploader.
pub struct AppStateParts {
    pub store: Arc<dyn ProductStore>,
    pub media: Arc<dyn MediaUploader>,
    pub credentials: CredentialAuthority,
    pub allowlist: AdminAllowlist,
    pub tokens: SessionTokens,
    pub staging: UploadStaging,
    /// Media host folder for product images.
    pub product_folder: String,
    /// Whether session cookies carry `Secure`.
    pub secure_cookies: bool,
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and read-only after startup.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    store: Arc<dyn ProductStore>,
    media: Arc<dyn MediaUploader>,
    credentials: CredentialAuthority,
    allowlist: AdminAllowlist,
    tokens: SessionTokens,
    staging: UploadStaging,
    product_folder: String,
    secure_cookies: bool,
}

impl AppState {
    /// Create application state from already-built parts.
    #[must_use]
    pub fn new(parts: AppStateParts) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                store: parts.store,
                media: parts.media,
                credentials: parts.credentials,
                allowlist: parts.allowlist,
                tokens: parts.tokens,
                staging: parts.staging,
                product_folder: parts.product_folder,
                secure_cookies: parts.secure_cookies,
            }),
        }
    }

    /// Build production state: `PostgreSQL` store, media client, operators
    /// file, and token keys.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the database is unreachable, the operators
    /// file is missing or invalid, or a client cannot be built.
    pub async fn from_config(config: &AdminConfig) -> Result<Self, StateError> {
        let pool = create_pool(&config.database_url).await?;
        let media = CloudinaryClient::new(&config.media)?;
        let (credentials, allowlist) = OperatorsFile::load(&config.operators_file)?.into_parts();
        let tokens = SessionTokens::new(&config.session_secret, config.session_ttl)?;

        tracing::info!(
            operators = credentials.len(),
            admins = allowlist.len(),
            "Loaded operators file"
        );

        Ok(Self::new(AppStateParts {
            store: Arc::new(PgProductStore::new(pool)),
            media: Arc::new(media),
            credentials,
            allowlist,
            tokens,
            staging: UploadStaging::new(&config.upload_dir),
            product_folder: config.media.product_folder.clone(),
            secure_cookies: config.secure_cookies(),
        }))
    }

    /// Get the product store.
    #[must_use]
    pub fn store(&self) -> &dyn ProductStore {
        self.inner.store.as_ref()
    }

    /// Get the media uploader.
    #[must_use]
    pub fn media(&self) -> &dyn MediaUploader {
        self.inner.media.as_ref()
    }

    /// Get the credential authority.
    #[must_use]
    pub fn credentials(&self) -> &CredentialAuthority {
        &self.inner.credentials
    }

    /// Get the admin allowlist.
    #[must_use]
    pub fn allowlist(&self) -> &AdminAllowlist {
        &self.inner.allowlist
    }

    /// Get the session token issuer.
    #[must_use]
    pub fn tokens(&self) -> &SessionTokens {
        &self.inner.tokens
    }

    /// Get the upload staging area.
    #[must_use]
    pub fn staging(&self) -> &UploadStaging {
        &self.inner.staging
    }

    #[must_use]
    pub fn product_folder(&self) -> &str {
        &self.inner.product_folder
    }

    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.inner.secure_cookies
    }
}
