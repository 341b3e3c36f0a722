//! Client for the synthesis job service.
//!
//! Submits jobs over HTTP and polls for completion with exponential backoff
//! up to the caller's timeout. A timed-out job may still finish server-side,
//! but the orchestrator stops waiting and treats the turn as failed.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::TtsClientSettings;
use crate::errors::SynthesisError;
use crate::service::JobStatus;

/// Orchestrator-facing synthesis capability.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize `text`, waiting at most `timeout` for a terminal status.
    async fn request_speech(&self, text: &str, timeout: Duration)
    -> Result<Bytes, SynthesisError>;
}

#[derive(Debug, Serialize)]
struct SubmitRequest<'a> {
    text: &'a str,
    output_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: JobStatus,
    /// Base64 audio, present once completed.
    result: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    ok: bool,
}

/// HTTP client for the job service's submit/poll surface.
pub struct SynthesisClient {
    client: reqwest::Client,
    base_url: String,
    poll_interval: Duration,
    backoff_factor: f32,
    max_poll_interval: Duration,
}

impl SynthesisClient {
    pub fn new(settings: &TtsClientSettings) -> Result<Self, SynthesisError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SynthesisError::Request(format!("client init failed: {e}")))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            backoff_factor: settings.backoff_factor,
            max_poll_interval: Duration::from_millis(settings.max_poll_interval_ms),
        })
    }

    /// Liveness probe against `/health`.
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => match response.json::<HealthResponse>().await {
                Ok(body) => body.ok,
                Err(_) => false,
            },
            Err(e) => {
                warn!("synthesis service unreachable: {e}");
                false
            }
        }
    }

    /// Fetch engine metadata from `/tts/models/info`.
    pub async fn model_info(&self) -> Result<serde_json::Value, SynthesisError> {
        let url = format!("{}/tts/models/info", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;
        response
            .json()
            .await
            .map_err(|e| SynthesisError::BadResponse(e.to_string()))
    }

    /// One-shot blocking synthesis via the synchronous endpoint.
    pub async fn synthesize_blocking(&self, text: &str) -> Result<Bytes, SynthesisError> {
        let url = format!("{}/tts/synthesize", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SubmitRequest {
                text,
                output_format: "wav",
            })
            .send()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SynthesisError::Request(format!(
                "service returned {}",
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| SynthesisError::BadResponse(e.to_string()))
    }

    async fn submit(&self, text: &str) -> Result<Uuid, SynthesisError> {
        let url = format!("{}/tts/synthesize_async", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&SubmitRequest {
                text,
                output_format: "wav",
            })
            .send()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SynthesisError::Request(format!(
                "submission rejected with {}",
                response.status()
            )));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| SynthesisError::BadResponse(e.to_string()))?;
        Ok(body.job_id)
    }

    async fn poll_status(&self, id: Uuid) -> Result<StatusResponse, SynthesisError> {
        let url = format!("{}/tts/status/{}", self.base_url, id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SynthesisError::Request(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(SynthesisError::JobNotFound(id));
        }
        if !response.status().is_success() {
            return Err(SynthesisError::Request(format!(
                "status query returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SynthesisError::BadResponse(e.to_string()))
    }
}

#[async_trait]
impl SpeechSynthesizer for SynthesisClient {
    async fn request_speech(
        &self,
        text: &str,
        timeout: Duration,
    ) -> Result<Bytes, SynthesisError> {
        let deadline = Instant::now() + timeout;
        let id = self.submit(text).await?;
        debug!(job_id = %id, "synthesis job submitted");

        let mut interval = self.poll_interval;
        loop {
            if Instant::now() >= deadline {
                warn!(job_id = %id, "synthesis polling deadline exceeded");
                return Err(SynthesisError::Timeout(timeout.as_millis() as u64));
            }

            let status = self.poll_status(id).await?;
            match status.status {
                JobStatus::Completed => {
                    let encoded = status.result.ok_or_else(|| {
                        SynthesisError::BadResponse("completed status without result".to_string())
                    })?;
                    let audio = BASE64
                        .decode(encoded)
                        .map_err(|e| SynthesisError::BadResponse(format!("bad audio: {e}")))?;
                    info!(job_id = %id, bytes = audio.len(), "synthesis result fetched");
                    return Ok(Bytes::from(audio));
                }
                JobStatus::Failed => {
                    let reason = status
                        .error
                        .unwrap_or_else(|| "unknown engine failure".to_string());
                    return Err(SynthesisError::JobFailed(id, reason));
                }
                JobStatus::Queued | JobStatus::Running => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    tokio::time::sleep(interval.min(remaining)).await;
                    interval = Duration::from_secs_f32(
                        (interval.as_secs_f32() * self.backoff_factor)
                            .min(self.max_poll_interval.as_secs_f32()),
                    );
                }
            }
        }
    }
}
