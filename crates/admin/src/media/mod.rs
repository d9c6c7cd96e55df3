//! Hosted media uploads.
//!
//! Multipart file parts are first written to a staging directory
//! ([`UploadStaging`]), then forwarded to the media host by a
//! [`MediaUploader`]. A staged file is removed once its upload succeeds;
//! if the upload fails the file stays on disk and the error is returned.
//!
//! The production uploader is [`CloudinaryClient`]. It is built from
//! configuration at startup and injected through application state.

mod cloudinary;
mod staging;

pub use cloudinary::CloudinaryClient;
pub use staging::{StagedFile, StagingError, UploadStaging};

use async_trait::async_trait;
use futures::future::try_join_all;
use thiserror::Error;

/// Errors that can occur when uploading to the media host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Media host returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Staged file could not be read.
    #[error("staged file error: {0}")]
    Io(#[from] std::io::Error),

    /// Response body was not what the media host documents.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// How the media host should treat an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    /// Images only (product photos).
    Image,
    /// Let the host detect image, video, or raw.
    Auto,
}

impl ResourceType {
    /// Path segment used by the upload API.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Auto => "auto",
        }
    }
}

/// Per-upload options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub resource_type: ResourceType,
    /// Destination folder on the media host.
    pub folder: Option<String>,
}

impl UploadOptions {
    /// Product images: resource type `image` in the given folder.
    #[must_use]
    pub fn product_images(folder: &str) -> Self {
        Self {
            resource_type: ResourceType::Image,
            folder: Some(folder.to_string()),
        }
    }

    /// Generic uploads: auto-detected resource type, no folder.
    #[must_use]
    pub const fn generic() -> Self {
        Self {
            resource_type: ResourceType::Auto,
            folder: None,
        }
    }
}

/// Uploads a staged file and returns its public URL.
#[async_trait]
pub trait MediaUploader: Send + Sync {
    /// Upload one file.
    ///
    /// Implementations must not delete the staged file; [`upload_all`]
    /// owns cleanup.
    async fn upload(&self, file: &StagedFile, options: &UploadOptions)
    -> Result<String, MediaError>;
}

/// Upload every staged file concurrently.
///
/// The returned URLs are index-paired with `files`. Each staged file is
/// deleted after its own upload succeeds. The first failure fails the
/// whole batch.
///
/// # Errors
///
/// Returns the first `MediaError` produced by any upload.
pub async fn upload_all(
    uploader: &dyn MediaUploader,
    files: &[StagedFile],
    options: &UploadOptions,
) -> Result<Vec<String>, MediaError> {
    let uploads = files.iter().map(|file| async move {
        let url = uploader.upload(file, options).await?;
        file.discard().await;
        Ok::<_, MediaError>(url)
    });

    let urls = try_join_all(uploads).await?;
    tracing::info!(count = urls.len(), resource_type = options.resource_type.as_str(), "Uploaded media");
    Ok(urls)
}
