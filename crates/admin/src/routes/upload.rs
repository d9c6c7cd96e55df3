//! Generic media upload: `POST /upload`.

use axum::{
    Json,
    extract::{Multipart, State, multipart::MultipartRejection},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::AppError;
use crate::media::{StagedFile, UploadOptions, upload_all};
use crate::middleware::RequireAdmin;
use crate::state::AppState;

/// Hosted URLs, in the order the files were sent.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub links: Vec<String>,
}

fn is_file_field(name: Option<&str>) -> bool {
    matches!(name, Some("file" | "file[]"))
}

/// Upload every `file` part with auto-detected resource type.
#[instrument(skip(state, multipart), fields(admin = %admin.id))]
pub async fn upload(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| AppError::Parse(e.body_text()))?;
    let mut files = Vec::new();

    let staged: Result<(), AppError> = async {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Parse(e.body_text()))?
        {
            if is_file_field(field.name()) && field.file_name().is_some_and(|f| !f.is_empty()) {
                files.push(state.staging().stage_field(field).await?);
            }
        }
        Ok(())
    }
    .await;

    if let Err(e) = staged {
        StagedFile::discard_all(&files).await;
        return Err(e);
    }

    let links = upload_all(state.media(), &files, &UploadOptions::generic()).await?;
    Ok(Json(UploadResponse { links }))
}
