//! Integration test support for Ecom Admin.
//!
//! Drives the real router in-process: an in-memory product store, a
//! recording media uploader in place of the media host, and a temporary
//! staging directory. No network or database is needed except for tests
//! marked `#[ignore]`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ecom-integration-tests
//!
//! # Including PostgreSQL-backed tests
//! DATABASE_URL=postgres://... cargo test -p ecom-integration-tests -- --ignored
//! ```

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use ecom_admin::db::MemoryProductStore;
use ecom_admin::media::{MediaError, MediaUploader, StagedFile, UploadOptions, UploadStaging};
use ecom_admin::models::CurrentAdmin;
use ecom_admin::services::auth::{OperatorsFile, hash_password};
use ecom_admin::state::{AppState, AppStateParts};

/// Signing secret used by every test app.
pub const TEST_SESSION_SECRET: &str = "t7#Kq!9zWm@2xLp$5vRn%8bYc^3hJd&6";

/// Operator on the admin allowlist.
pub const ADMIN_EMAIL: &str = "ops@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery";
pub const ADMIN_ID: &str = "1";

/// Operator who can sign in but is not an admin.
pub const VIEWER_EMAIL: &str = "viewer@example.com";
pub const VIEWER_PASSWORD: &str = "another long passphrase";
pub const VIEWER_ID: &str = "2";

pub const MULTIPART_BOUNDARY: &str = "ecom-test-boundary-7MA4YWxkTrZu0gW";

/// Operators YAML, hashed once per test binary.
fn operators_yaml() -> &'static str {
    static YAML: OnceLock<String> = OnceLock::new();
    YAML.get_or_init(|| {
        let admin_hash = hash_password(ADMIN_PASSWORD).expect("hash admin password");
        let viewer_hash = hash_password(VIEWER_PASSWORD).expect("hash viewer password");
        format!(
            r#"
operators:
  - id: "{ADMIN_ID}"
    name: Test User
    email: {ADMIN_EMAIL}
    password_hash: "{admin_hash}"
  - id: "{VIEWER_ID}"
    name: Viewer
    email: {VIEWER_EMAIL}
    password_hash: "{viewer_hash}"
admins:
  - {ADMIN_EMAIL}
"#
        )
    })
}

// =============================================================================
// Recording Uploader
// =============================================================================

/// One call made to the media uploader.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    pub file_name: Option<String>,
    pub staged_path: PathBuf,
    pub options: UploadOptions,
    pub bytes: Vec<u8>,
}

/// Stands in for the media host. Records every upload and returns
/// `https://media.example.test/<folder>/<n>-<file name>`.
#[derive(Debug, Default)]
pub struct RecordingUploader {
    calls: Mutex<Vec<RecordedUpload>>,
    failure: Mutex<Option<String>>,
    failing_file: Mutex<Option<String>>,
}

impl RecordingUploader {
    /// Make every later upload fail with the given host message.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().expect("uploader lock") = Some(message.to_string());
    }

    /// Make later uploads of the named file fail; other files succeed.
    pub fn fail_on(&self, file_name: &str) {
        *self.failing_file.lock().expect("uploader lock") = Some(file_name.to_string());
    }

    /// Uploads made so far.
    pub fn calls(&self) -> Vec<RecordedUpload> {
        self.calls.lock().expect("uploader lock").clone()
    }
}

#[async_trait]
impl MediaUploader for RecordingUploader {
    async fn upload(
        &self,
        file: &StagedFile,
        options: &UploadOptions,
    ) -> Result<String, MediaError> {
        let bytes = tokio::fs::read(file.path()).await?;
        let failing_file = self.failing_file.lock().expect("uploader lock").clone();
        let failure = self.failure.lock().expect("uploader lock").clone().or_else(|| {
            failing_file
                .filter(|name| file.file_name() == Some(name.as_str()))
                .map(|name| format!("Rejected {name}"))
        });

        let mut calls = self.calls.lock().expect("uploader lock");
        calls.push(RecordedUpload {
            file_name: file.file_name().map(str::to_owned),
            staged_path: file.path().to_path_buf(),
            options: options.clone(),
            bytes,
        });

        if let Some(message) = failure {
            return Err(MediaError::Api {
                status: 400,
                message,
            });
        }

        Ok(format!(
            "https://media.example.test/{}/{}-{}",
            options.folder.as_deref().unwrap_or("root"),
            calls.len(),
            file.file_name().unwrap_or("unnamed")
        ))
    }
}

// =============================================================================
// Test App
// =============================================================================

/// A fully wired router plus handles on its fakes.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryProductStore>,
    pub media: Arc<RecordingUploader>,
    staging_dir: TempDir,
}

impl TestApp {
    /// Build a fresh app with an empty store.
    pub fn new() -> Self {
        let (credentials, allowlist) = OperatorsFile::from_yaml(operators_yaml())
            .expect("valid operators yaml")
            .into_parts();
        let staging_dir = tempfile::tempdir().expect("staging dir");
        let store = Arc::new(MemoryProductStore::new());
        let media = Arc::new(RecordingUploader::default());

        let state = AppState::new(AppStateParts {
            store: store.clone(),
            media: media.clone(),
            credentials,
            allowlist,
            tokens: ecom_admin::services::SessionTokens::new(
                &SecretString::from(TEST_SESSION_SECRET),
                Duration::from_secs(3600),
            )
            .expect("session tokens"),
            staging: UploadStaging::new(staging_dir.path()),
            product_folder: "products".to_string(),
            secure_cookies: true,
        });

        Self {
            router: ecom_admin::app(state.clone(), 1024 * 1024),
            state,
            store,
            media,
            staging_dir,
        }
    }

    /// Directory multipart files are staged in.
    pub fn staging_dir(&self) -> &Path {
        self.staging_dir.path()
    }

    /// Number of files currently staged.
    pub fn staged_file_count(&self) -> usize {
        std::fs::read_dir(self.staging_dir())
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    /// A session token for the allowlisted admin.
    pub fn admin_token(&self) -> String {
        self.token_for(ADMIN_ID, "Test User", ADMIN_EMAIL)
    }

    /// A valid session token for an operator who is not an admin.
    pub fn viewer_token(&self) -> String {
        self.token_for(VIEWER_ID, "Viewer", VIEWER_EMAIL)
    }

    fn token_for(&self, id: &str, name: &str, email: &str) -> String {
        let admin = CurrentAdmin {
            id: ecom_core::OperatorId::new(id),
            name: name.to_string(),
            email: ecom_core::Email::parse(email).expect("valid email"),
        };
        self.state.tokens().issue(&admin).expect("issue token").token
    }

    /// Send a request through the router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        TestResponse::read(response).await
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    async fn read(response: Response<Body>) -> Self {
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body")
            .to_vec();
        Self {
            status,
            headers,
            body,
        }
    }

    /// Body parsed as JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("JSON body")
    }

    /// Body as UTF-8 text.
    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("UTF-8 body")
    }

    /// A header value as text.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

// =============================================================================
// Request Builders
// =============================================================================

/// Request with an optional bearer token and no body.
pub fn empty_request(method: &str, uri: &str, token: Option<&str>) -> Request<Body> {
    with_token(Request::builder().method(method).uri(uri), token)
        .body(Body::empty())
        .expect("request")
}

/// Request with a JSON body.
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    with_token(Request::builder().method(method).uri(uri), token)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

/// Request with a `multipart/form-data` body.
pub fn multipart_request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    form: MultipartForm,
) -> Request<Body> {
    with_token(Request::builder().method(method).uri(uri), token)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
        )
        .body(Body::from(form.finish()))
        .expect("request")
}

fn with_token(
    builder: axum::http::request::Builder,
    token: Option<&str>,
) -> axum::http::request::Builder {
    match token {
        Some(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
        None => builder,
    }
}

/// Hand-built multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field.
    #[must_use]
    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    /// Add a file part.
    #[must_use]
    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{MULTIPART_BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}
