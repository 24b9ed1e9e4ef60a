//! Upload and artifact-download handlers.
//!
//! Uploads are stored as `{file_id}_{sanitized filename}` so the id maps
//! back to the original name; downloads resolve through the orchestrator's
//! artifact gate and never expose raw paths in responses.

use axum::extract::{Multipart, Path, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use doctrans_core::defaults::MAX_UPLOAD_SIZE_BYTES;
use doctrans_core::{sanitize_filename, validate_upload, ArtifactKind};

use crate::{ApiError, AppState};

/// Response from a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Id to hand to the translate endpoint.
    pub file_id: Uuid,
    /// Sanitized filename the upload was stored under.
    pub filename: String,
    /// Stored location, for diagnostics.
    pub path: String,
}

/// Store an uploaded source document.
///
/// Accepts multipart/form-data with a `file` field. Only PDFs are accepted;
/// the content is checked, not just the extension.
///
/// # Returns
/// - 200 OK with `{file_id, filename, path}`
/// - 400 Bad Request if the file field is missing, empty, or not a PDF
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut client_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("file") => {
                client_name = field.file_name().map(|n| n.to_string());
                file_data = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("Read error: {}", e)))?
                        .to_vec(),
                );
            }
            _ => {} // ignore unknown fields
        }
    }

    let data = file_data
        .ok_or_else(|| ApiError::BadRequest("Missing file in multipart form".to_string()))?;
    if data.is_empty() {
        return Err(ApiError::BadRequest("Uploaded file is empty".into()));
    }

    let filename = sanitize_filename(client_name.as_deref().unwrap_or("document.pdf"));
    let check = validate_upload(&filename, &data, MAX_UPLOAD_SIZE_BYTES as u64);
    if !check.allowed {
        return Err(ApiError::BadRequest(
            check.reason.unwrap_or_else(|| "Upload rejected".to_string()),
        ));
    }

    let file_id = Uuid::new_v4();
    let upload_dir = state.orchestrator.upload_dir();
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(doctrans_core::Error::from)?;
    let path = upload_dir.join(format!("{file_id}_{filename}"));
    tokio::fs::write(&path, &data)
        .await
        .map_err(doctrans_core::Error::from)?;

    info!(
        file_id = %file_id,
        filename = %filename,
        size_bytes = data.len(),
        "stored upload"
    );

    Ok(Json(UploadResponse {
        file_id,
        filename,
        path: path.display().to_string(),
    }))
}

/// Download a produced artifact as `application/pdf`.
///
/// # Returns
/// - 200 OK with the PDF bytes and a content-disposition filename
/// - 400 Bad Request if the kind is unknown or the job is not Completed
/// - 404 Not Found if the job or artifact does not exist, or the file
///   has vanished from disk
pub async fn download_artifact(
    State(state): State<AppState>,
    Path((job_id, kind)): Path<(Uuid, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let kind = match kind.as_str() {
        "mono" => ArtifactKind::Mono,
        "dual" => ArtifactKind::Dual,
        other => {
            return Err(ApiError::BadRequest(format!(
                "Unknown artifact kind '{other}'; expected 'mono' or 'dual'"
            )))
        }
    };

    let path = state.orchestrator.artifact_path(job_id, kind).await?;
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(doctrans_core::Error::from)?;

    let download_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| format!("{job_id}-{kind}.pdf", kind = kind.as_str()));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/pdf"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{download_name}\""))
            .map_err(|_| ApiError::BadRequest("Artifact filename is not header-safe".into()))?,
    );

    Ok((headers, bytes))
}
