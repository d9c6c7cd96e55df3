//! Staging of multipart file parts on local disk.

use std::path::{Path, PathBuf};

use axum::extract::multipart::{Field, MultipartError};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

const MAX_EXTENSION_LEN: usize = 10;

/// Errors writing a file part to the staging directory.
#[derive(Debug, Error)]
pub enum StagingError {
    #[error("multipart error: {0}")]
    Multipart(#[from] MultipartError),

    #[error("staging io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A file part written to disk, awaiting upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    path: PathBuf,
    file_name: Option<String>,
    content_type: Option<String>,
    size: u64,
}

impl StagedFile {
    /// Location of the staged bytes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// File name supplied by the client, if any.
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Content type supplied by the client, if any.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Size in bytes.
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Remove the staged file. Failures are logged, not returned.
    pub async fn discard(&self) {
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove staged file");
        }
    }

    /// Remove every staged file in `files`.
    pub async fn discard_all(files: &[Self]) {
        for file in files {
            file.discard().await;
        }
    }
}

/// Writes file parts into a staging directory.
#[derive(Debug, Clone)]
pub struct UploadStaging {
    dir: PathBuf,
}

impl UploadStaging {
    /// Stage into `dir`; the directory is created on first use.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// The staging directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stream a multipart file part to disk.
    ///
    /// A partially written file is removed if the part fails mid-stream.
    ///
    /// # Errors
    ///
    /// Returns `StagingError::Multipart` if the body is malformed and
    /// `StagingError::Io` if the file cannot be written.
    pub async fn stage_field(&self, mut field: Field<'_>) -> Result<StagedFile, StagingError> {
        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let path = self.allocate(file_name.as_deref()).await?;

        let mut out = tokio::fs::File::create(&path).await?;
        let mut size = 0_u64;
        let written: Result<(), StagingError> = async {
            while let Some(chunk) = field.chunk().await? {
                size += chunk.len() as u64;
                out.write_all(&chunk).await?;
            }
            out.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = written {
            drop(out);
            let _ = tokio::fs::remove_file(&path).await;
            return Err(e);
        }

        tracing::debug!(path = %path.display(), size, "Staged upload");
        Ok(StagedFile {
            path,
            file_name,
            content_type,
            size,
        })
    }

    /// Stage an in-memory buffer.
    ///
    /// # Errors
    ///
    /// Returns `StagingError::Io` if the file cannot be written.
    pub async fn stage_bytes(
        &self,
        file_name: Option<&str>,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> Result<StagedFile, StagingError> {
        let path = self.allocate(file_name).await?;
        tokio::fs::write(&path, bytes).await?;

        Ok(StagedFile {
            path,
            file_name: file_name.map(str::to_owned),
            content_type: content_type.map(str::to_owned),
            size: bytes.len() as u64,
        })
    }

    async fn allocate(&self, file_name: Option<&str>) -> Result<PathBuf, std::io::Error> {
        tokio::fs::create_dir_all(&self.dir).await?;
        Ok(self.dir.join(staged_name(file_name)))
    }
}

/// Random name that keeps a short, alphanumeric extension from the
/// client's file name. Client names never reach the filesystem otherwise.
fn staged_name(file_name: Option<&str>) -> String {
    let id = Uuid::new_v4().simple();
    let extension = file_name
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric())
        });

    match extension {
        Some(ext) => format!("upload_{id}.{}", ext.to_ascii_lowercase()),
        None => format!("upload_{id}"),
    }
}
