//! Cloudinary upload API client.
//!
//! # API Reference
//!
//! - Endpoint: `POST {base}/{cloud_name}/{resource_type}/upload`
//! - Authentication: signed request. The signed parameters (everything
//!   except `file`, `api_key`, and the signature fields) are sorted by name,
//!   joined as `k=v&k=v`, suffixed with the API secret, and hashed with
//!   SHA-256.
//! - Success: JSON with `secure_url`
//! - Failure: JSON `{"error": {"message": "..."}}`

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::instrument;

use super::{MediaError, MediaUploader, StagedFile, UploadOptions};
use crate::config::MediaConfig;

const SIGNATURE_ALGORITHM: &str = "sha256";

/// Successful upload response (only the fields we use).
#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

/// Error envelope returned by the upload API.
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Cloudinary upload client.
///
/// Cheap to clone; the HTTP client and credentials are shared.
#[derive(Clone)]
pub struct CloudinaryClient {
    inner: Arc<CloudinaryClientInner>,
}

struct CloudinaryClientInner {
    client: reqwest::Client,
    api_base_url: String,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryClient")
            .field("api_base_url", &self.inner.api_base_url)
            .field("cloud_name", &self.inner.cloud_name)
            .finish_non_exhaustive()
    }
}

impl CloudinaryClient {
    /// Create a new upload client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MediaConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("ecom-admin/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(CloudinaryClientInner {
                client,
                api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
                cloud_name: config.cloud_name.clone(),
                api_key: config.api_key.clone(),
                api_secret: config.api_secret.clone(),
            }),
        })
    }

    fn upload_url(&self, options: &UploadOptions) -> String {
        format!(
            "{}/{}/{}/upload",
            self.inner.api_base_url,
            self.inner.cloud_name,
            options.resource_type.as_str()
        )
    }

    fn sign(&self, params: &BTreeMap<&str, String>) -> String {
        sign_params(params, &self.inner.api_secret)
    }
}

#[async_trait]
impl MediaUploader for CloudinaryClient {
    #[instrument(skip(self, file), fields(size = file.size(), resource_type = options.resource_type.as_str()))]
    async fn upload(
        &self,
        file: &StagedFile,
        options: &UploadOptions,
    ) -> Result<String, MediaError> {
        let mut params = BTreeMap::new();
        params.insert("timestamp", Utc::now().timestamp().to_string());
        if let Some(folder) = &options.folder {
            params.insert("folder", folder.clone());
        }
        let signature = self.sign(&params);

        let bytes = tokio::fs::read(file.path()).await?;
        let mut part = Part::bytes(bytes).file_name(file.file_name().unwrap_or("upload").to_string());
        if let Some(content_type) = file.content_type() {
            part = part.mime_str(content_type)?;
        }

        let mut form = Form::new()
            .part("file", part)
            .text("api_key", self.inner.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", SIGNATURE_ALGORITHM);
        for (key, value) in params {
            form = form.text(key, value);
        }

        let response = self
            .inner
            .client
            .post(self.upload_url(options))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!(status = status.as_u16(), %message, "Media upload rejected");
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let uploaded: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))?;
        Ok(uploaded.secure_url)
    }
}

/// The string the signature covers: sorted `k=v` pairs joined by `&`.
fn string_to_sign(params: &BTreeMap<&str, String>) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

/// Hex SHA-256 of the string to sign followed by the API secret.
fn sign_params(params: &BTreeMap<&str, String>, secret: &SecretString) -> String {
    let mut hasher = Sha256::new();
    hasher.update(string_to_sign(params).as_bytes());
    hasher.update(secret.expose_secret().as_bytes());
    hex::encode(hasher.finalize())
}
