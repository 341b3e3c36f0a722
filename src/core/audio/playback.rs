//! Audio playback to the speakers.
//!
//! Accepts one WAV buffer at a time, plays it to completion on the default
//! output device, and returns exactly once. The orchestrator relies on that
//! completion signal to resume listening.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, StreamConfig};
use tracing::debug;

use crate::errors::PipelineError;

/// Orchestrator-facing playback capability.
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play one audio buffer to completion.
    async fn play(&self, audio: Bytes) -> Result<(), PipelineError>;
}

/// Plays WAV buffers on the default output device.
pub struct AudioPlayback;

impl AudioPlayback {
    /// Verify an output device exists up front so a missing speaker fails
    /// at startup instead of mid-conversation.
    pub fn new() -> Result<Self, PipelineError> {
        let host = cpal::default_host();
        host.default_output_device()
            .ok_or_else(|| PipelineError::Device("no output device available".to_string()))?;
        Ok(Self)
    }
}

#[async_trait]
impl AudioSink for AudioPlayback {
    async fn play(&self, audio: Bytes) -> Result<(), PipelineError> {
        let (samples, sample_rate) = decode_wav(&audio)?;
        if samples.is_empty() {
            return Ok(());
        }

        // The device callback loop blocks until exhaustion, so it runs off
        // the async runtime.
        tokio::task::spawn_blocking(move || play_samples_blocking(samples, sample_rate))
            .await
            .map_err(|e| PipelineError::Device(format!("playback task failed: {e}")))?
    }
}

/// Decode a WAV buffer into normalized mono f32 samples.
fn decode_wav(audio: &[u8]) -> Result<(Vec<f32>, u32), PipelineError> {
    let reader = hound::WavReader::new(Cursor::new(audio))
        .map_err(|e| PipelineError::Device(format!("bad WAV buffer: {e}")))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;

    let raw: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Int => {
            let scale = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| PipelineError::Device(format!("bad WAV samples: {e}")))?
        }
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| PipelineError::Device(format!("bad WAV samples: {e}")))?,
    };

    // Downmix to mono if needed
    let samples = if channels > 1 {
        raw.chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
            .collect()
    } else {
        raw
    };

    Ok((samples, spec.sample_rate))
}

/// Feed samples to the output device and wait until they have all played.
fn play_samples_blocking(samples: Vec<f32>, sample_rate: u32) -> Result<(), PipelineError> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| PipelineError::Device("no output device".to_string()))?;

    let supported = device
        .supported_output_configs()
        .map_err(|e| PipelineError::Device(e.to_string()))?
        .find(|c| {
            c.min_sample_rate() <= SampleRate(sample_rate)
                && c.max_sample_rate() >= SampleRate(sample_rate)
        })
        .ok_or_else(|| {
            PipelineError::Device(format!("no output config for {sample_rate} Hz"))
        })?;
    let config: StreamConfig = supported.with_sample_rate(SampleRate(sample_rate)).config();
    let channels = config.channels as usize;

    let total = samples.len();
    let samples = Arc::new(samples);
    let position = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicBool::new(false));

    let cb_samples = Arc::clone(&samples);
    let cb_position = Arc::clone(&position);
    let cb_finished = Arc::clone(&finished);

    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                let mut pos = cb_position.load(Ordering::Acquire);
                for frame in data.chunks_mut(channels) {
                    let sample = if pos < cb_samples.len() {
                        let s = cb_samples[pos];
                        pos += 1;
                        s
                    } else {
                        cb_finished.store(true, Ordering::Release);
                        0.0
                    };
                    for out in frame.iter_mut() {
                        *out = sample;
                    }
                }
                cb_position.store(pos, Ordering::Release);
            },
            |err| {
                tracing::error!("audio playback error: {err}");
            },
            None,
        )
        .map_err(|e| PipelineError::Device(e.to_string()))?;

    stream.play().map_err(|e| PipelineError::Device(e.to_string()))?;

    // Wait for exhaustion, bounded by the buffer duration plus slack
    let duration_ms = (total as u64 * 1000) / u64::from(sample_rate);
    let deadline = std::time::Instant::now() + Duration::from_millis(duration_ms + 500);
    while !finished.load(Ordering::Acquire) {
        if std::time::Instant::now() > deadline {
            break;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    // Let the device drain its last buffer
    std::thread::sleep(Duration::from_millis(50));

    drop(stream);
    debug!(samples = total, "playback complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn wav_bytes(samples: &[i16], sample_rate: u32) -> Vec<u8> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut cursor = Cursor::new(Vec::new());
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_decode_wav_roundtrip() {
        let bytes = wav_bytes(&[0, i16::MAX, i16::MIN / 2], 16000);
        let (samples, rate) = decode_wav(&bytes).unwrap();

        assert_eq!(rate, 16000);
        assert_eq!(samples.len(), 3);
        assert!(samples[0].abs() < 1e-6);
        assert!((samples[1] - (i16::MAX as f32 / 32768.0)).abs() < 1e-4);
        assert!((samples[2] + 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(decode_wav(b"definitely not wav data").is_err());
    }
}
