//! Synthesis engine boundary.
//!
//! The neural synthesis model is an external collaborator; this module only
//! defines the seam the worker drives it through and ships a tone-generating
//! stand-in used for local operation and tests.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

/// Metadata reported on `/tts/models/info`.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub name: String,
    pub sample_rate: u32,
    pub output_format: String,
}

/// Opaque synthesize(text) -> audio capability.
///
/// Takes `&mut self`: engines are stateful and non-reentrant, so each worker
/// owns its engine exclusively and runs one job at a time against it.
#[async_trait]
pub trait SynthesisEngine: Send {
    async fn synthesize(&mut self, text: &str) -> anyhow::Result<Bytes>;

    fn info(&self) -> ModelInfo;
}

/// Deterministic stand-in engine producing WAV-encoded tones.
///
/// Each character of input maps to a short fixed-pitch beep, so output
/// length scales with text length and the same text always produces the
/// same bytes. An optional artificial delay models a slow engine.
pub struct ToneEngine {
    sample_rate: u32,
    delay: Option<Duration>,
}

impl ToneEngine {
    const MS_PER_CHAR: u32 = 80;

    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            delay: None,
        }
    }

    /// Add a fixed per-request delay. Used in tests to observe jobs in
    /// their queued and running states.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn render(&self, text: &str) -> anyhow::Result<Bytes> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            let samples_per_char =
                (self.sample_rate as u64 * Self::MS_PER_CHAR as u64 / 1000) as usize;

            for ch in text.chars() {
                // Pitch derived from the character keeps output deterministic
                let freq = 220.0 + f32::from((ch as u32 % 64) as u8) * 10.0;
                for n in 0..samples_per_char {
                    let t = n as f32 / self.sample_rate as f32;
                    let sample = (t * freq * 2.0 * std::f32::consts::PI).sin() * 0.3;
                    writer.write_sample((sample * i16::MAX as f32) as i16)?;
                }
            }
            writer.finalize()?;
        }

        Ok(Bytes::from(cursor.into_inner()))
    }
}

#[async_trait]
impl SynthesisEngine for ToneEngine {
    async fn synthesize(&mut self, text: &str) -> anyhow::Result<Bytes> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.render(text)
    }

    fn info(&self) -> ModelInfo {
        ModelInfo {
            name: "tone-stub".to_string(),
            sample_rate: self.sample_rate,
            output_format: "wav".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tone_engine_output_is_nonempty_wav() {
        let mut engine = ToneEngine::new(16000);
        let audio = engine.synthesize("hi").await.unwrap();

        assert!(!audio.is_empty());
        // RIFF header
        assert_eq!(&audio[0..4], b"RIFF");
        assert_eq!(&audio[8..12], b"WAVE");
    }

    #[tokio::test]
    async fn test_tone_engine_is_deterministic() {
        let mut engine = ToneEngine::new(16000);
        let a = engine.synthesize("same text").await.unwrap();
        let b = engine.synthesize("same text").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_longer_text_longer_audio() {
        let mut engine = ToneEngine::new(16000);
        let short = engine.synthesize("ab").await.unwrap();
        let long = engine.synthesize("abcdefgh").await.unwrap();
        assert!(long.len() > short.len());
    }
}
