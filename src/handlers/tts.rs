//! Synthesis endpoints: synchronous, asynchronous submit, and status.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::service::JobStatus;
use crate::state::AppState;

/// Request body for both synthesize endpoints.
#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: String,
    #[serde(default = "default_output_format")]
    pub output_format: String,
}

fn default_output_format() -> String {
    "wav".to_string()
}

#[derive(Debug, Serialize)]
pub struct SubmitResponse {
    pub job_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub job_id: Uuid,
    pub status: JobStatus,
    /// Base64 audio, present once the job completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn check_format(format: &str) -> AppResult<()> {
    if format != "wav" {
        return Err(AppError::BadRequest(format!(
            "unsupported output format '{format}'"
        )));
    }
    Ok(())
}

/// POST /tts/synthesize — blocking synthesis with a server-side timeout.
pub async fn synthesize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SynthesizeRequest>,
) -> AppResult<Response> {
    check_format(&request.output_format)?;

    info!(chars = request.text.chars().count(), "synchronous synthesis requested");
    let audio = state.broker.synthesize(&request.text).await?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    Ok((headers, audio).into_response())
}

/// POST /tts/synthesize_async — non-blocking job submission.
pub async fn synthesize_async(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SynthesizeRequest>,
) -> AppResult<Json<SubmitResponse>> {
    check_format(&request.output_format)?;

    let job_id = state.broker.submit(&request.text)?;
    Ok(Json(SubmitResponse { job_id }))
}

/// GET /tts/status/{job_id} — job status, result inline once terminal.
pub async fn job_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<Uuid>,
) -> AppResult<Json<StatusResponse>> {
    let view = state.broker.status(job_id)?;

    Ok(Json(StatusResponse {
        job_id: view.id,
        status: view.status,
        result: view.result.map(|audio| BASE64.encode(&audio)),
        error: view.error,
    }))
}
