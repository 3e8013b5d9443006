//! Multipart upload handling shared by the HTML form and the JSON API.

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use tracing::{info, warn};

use super::error::ApiError;
use super::AppState;
use crate::db::{MediaItem, NewMedia};
use crate::error::{ShareError, ShareResult};
use crate::session::Session;
use crate::storage::{format_size, UploadFile};

/// Fields of an upload form.
#[derive(Debug, Default)]
pub struct UploadRequest {
    pub title: String,
    pub description: String,
    pub file: Option<UploadFile>,
}

/// Read `title`, `description` and `file` parts. Unknown parts are skipped.
///
/// # Errors
///
/// A body over the size limit becomes a validation error; other multipart
/// failures are bad requests.
pub async fn read_upload(mut multipart: Multipart, max_bytes: u64) -> Result<UploadRequest, ApiError> {
    let mut request = UploadRequest::default();
    let to_api_error = |e: MultipartError| multipart_error(&e, max_bytes);

    while let Some(field) = multipart.next_field().await.map_err(to_api_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "title" => request.title = field.text().await.map_err(to_api_error)?,
            "description" => request.description = field.text().await.map_err(to_api_error)?,
            "file" => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .or_else(|| mime_guess::from_path(&file_name).first_raw().map(str::to_string))
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let bytes = field.bytes().await.map_err(to_api_error)?;

                // Browsers send an empty, nameless part when no file was chosen.
                if !(file_name.is_empty() && bytes.is_empty()) {
                    request.file = Some(UploadFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(request)
}

fn multipart_error(err: &MultipartError, max_bytes: u64) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::Share(ShareError::Validation(format!(
            "File size cannot exceed {}",
            format_size(max_bytes)
        )))
    } else {
        ApiError::BadRequest(err.body_text())
    }
}

/// Store the file, then create the media row pointing at it.
///
/// The title is checked before the file is sent so a form with no title
/// doesn't leave an orphaned object behind.
///
/// # Errors
///
/// Validation errors for a missing title or file or a rejected file, and
/// storage or repository failures.
pub async fn publish(state: &AppState, session: &Session, request: UploadRequest) -> ShareResult<MediaItem> {
    if request.title.trim().is_empty() {
        return Err(ShareError::validation("Title is required"));
    }
    let Some(file) = request.file else {
        return Err(ShareError::validation("Please choose an image file"));
    };

    let stored = state.storage.upload(&file, &session.user_id).await?;

    let new_media = NewMedia {
        title: request.title,
        description: Some(request.description),
        image_url: stored.public_url,
        file_path: stored.path,
        author_id: session.user_id.clone(),
    };

    match state.repo.create_media(&new_media).await {
        Ok(item) => {
            info!(media_id = %item.id, user_id = %session.user_id, "Published media");
            Ok(item)
        }
        Err(e) => {
            warn!(path = %new_media.file_path, "Stored file has no media row: {e}");
            Err(e)
        }
    }
}
