//! HTTP adapter for a remote recognition service.

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::base::SpeechRecognizer;
use crate::core::audio::Utterance;
use crate::errors::PipelineError;

#[derive(Debug, Serialize)]
struct RecognizeRequest {
    /// Base64 of little-endian 16-bit PCM.
    audio: String,
    sample_rate: u32,
}

#[derive(Debug, Deserialize)]
struct RecognizeResponse {
    text: String,
}

/// Recognizer that posts utterance audio to a remote endpoint.
pub struct HttpRecognizer {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRecognizer {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Recognition(format!("client init failed: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Pack normalized f32 samples as little-endian i16 PCM.
    fn encode_pcm(samples: &[f32]) -> Vec<u8> {
        let mut pcm = Vec::with_capacity(samples.len() * 2);
        for sample in samples {
            let value = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            pcm.extend_from_slice(&value.to_le_bytes());
        }
        pcm
    }
}

#[async_trait]
impl SpeechRecognizer for HttpRecognizer {
    async fn recognize(&self, utterance: &Utterance) -> Result<String, PipelineError> {
        let request = RecognizeRequest {
            audio: BASE64.encode(Self::encode_pcm(&utterance.samples)),
            sample_rate: utterance.sample_rate,
        };

        debug!(
            duration_ms = utterance.duration_ms(),
            endpoint = %self.endpoint,
            "sending utterance for recognition"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| PipelineError::Recognition(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PipelineError::Recognition(format!(
                "recognizer returned {}",
                response.status()
            )));
        }

        let body: RecognizeResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Recognition(format!("malformed response: {e}")))?;

        Ok(body.text)
    }
}
