//! HTTP adapter for a remote generation service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::base::ReplyGenerator;
use crate::core::history::{ConversationTurn, Speaker};
use crate::errors::PipelineError;

#[derive(Debug, Serialize)]
struct HistoryEntry {
    role: &'static str,
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    input: String,
    history: Vec<HistoryEntry>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    text: String,
}

/// Generator that posts the transcript and context to a remote endpoint.
pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGenerator {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Generation(format!("client init failed: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl ReplyGenerator for HttpGenerator {
    async fn generate(
        &self,
        text: &str,
        history: &[ConversationTurn],
    ) -> Result<String, PipelineError> {
        let request = GenerateRequest {
            input: text.to_string(),
            history: history
                .iter()
                .map(|turn| HistoryEntry {
                    role: match turn.speaker {
                        Speaker::User => "user",
                        Speaker::Agent => "agent",
                    },
                    text: turn.text.clone(),
                })
                .collect(),
        };

        debug!(
            context_turns = history.len(),
            endpoint = %self.endpoint,
            "requesting reply generation"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Generation(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::Generation(format!(
                "generator returned {}",
                response.status()
            )));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Generation(format!("malformed response: {e}")))?;

        Ok(body.text)
    }
}
