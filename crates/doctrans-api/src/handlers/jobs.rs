//! Translation job handlers: create, status, cancel.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::{Form, Json};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use doctrans_core::{JobSnapshot, JobStatus, RawInputs, SaveMode};

use crate::{ApiError, AppState};

/// Response from the translate endpoint.
#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub job_id: Uuid,
}

/// Response from the cancel endpoint.
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub status: JobStatus,
    /// Present when the request was a no-op against a settled job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Start a translation job.
///
/// Accepts a urlencoded flat form: `file_id`, optional `save_mode`, and the
/// raw settings inputs (language pair, `service`, rate-limit fields, engine
/// detail fields, PDF switches). Settings problems reject the request here;
/// no job record is created for an invalid form.
///
/// # Returns
/// - 200 OK with `{job_id}`
/// - 400 Bad Request on a missing `file_id` or invalid settings
/// - 404 Not Found if no upload matches `file_id`
pub async fn create_translation(
    State(state): State<AppState>,
    Form(mut fields): Form<BTreeMap<String, String>>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let file_id = fields
        .remove("file_id")
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing file_id".to_string()))?;

    // API calls default to never persisting the job's settings as the new
    // defaults; clients opt in explicitly.
    let save_mode = match fields.remove("save_mode") {
        Some(label) if !label.trim().is_empty() => SaveMode::from_label(&label)
            .ok_or_else(|| ApiError::BadRequest(format!("Unknown save mode '{label}'")))?,
        _ => SaveMode::Never,
    };

    let inputs: RawInputs = fields.into_iter().collect();
    let job_id = state
        .orchestrator
        .create_job(file_id.trim(), &inputs, save_mode)
        .await?;

    info!(job_id = %job_id, file_id = %file_id, "translation accepted");

    Ok(Json(TranslateResponse { job_id }))
}

/// Read-consistent snapshot of one job.
///
/// # Returns
/// - 200 OK with the snapshot (status, logs, artifact flags, error,
///   timestamps)
/// - 404 Not Found for an unknown job id
pub async fn job_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobSnapshot>, ApiError> {
    let snapshot = state.orchestrator.status(job_id).await?;
    Ok(Json(snapshot))
}

/// Cancel a job. Cancelling a settled job reports its status unchanged.
///
/// # Returns
/// - 200 OK with `{status, message?}`
/// - 404 Not Found for an unknown job id
pub async fn cancel_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<CancelResponse>, ApiError> {
    let outcome = state.orchestrator.cancel(job_id).await?;
    Ok(Json(CancelResponse {
        status: outcome.status,
        message: outcome.note,
    }))
}
