//! Audio capture from the microphone.
//!
//! The cpal callback slices the device stream into fixed-size frames and
//! hands them off over a channel; nothing blocking runs inline. A gate flag
//! implements the half-duplex contract: while the agent is thinking or
//! speaking, incoming audio is dropped at the callback so the system never
//! hears its own voice.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream, StreamConfig};
use tokio::sync::mpsc;
use tracing::{debug, error};

use super::frame::AudioFrame;
use crate::config::AudioSettings;
use crate::errors::PipelineError;

/// Owns the microphone stream and produces an unending frame sequence.
///
/// The device handle is released when this value drops, on every exit path.
pub struct AudioCapture {
    // Held for its Drop: dropping the stream closes the device.
    _stream: Stream,
    gate: Arc<AtomicBool>,
    frames: mpsc::UnboundedReceiver<AudioFrame>,
    sample_rate: u32,
}

impl AudioCapture {
    /// Open the default input device and start capturing.
    pub fn start(settings: &AudioSettings) -> Result<Self, PipelineError> {
        let host = cpal::default_host();
        let device = host
            .default_input_device()
            .ok_or_else(|| PipelineError::Device("no input device available".to_string()))?;

        let sample_rate = settings.sample_rate;
        let supported = device
            .supported_input_configs()
            .map_err(|e| PipelineError::Device(e.to_string()))?
            .find(|c| {
                c.channels() == settings.channels
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            })
            .ok_or_else(|| {
                PipelineError::Device(format!(
                    "no input config for {} Hz mono",
                    sample_rate
                ))
            })?;

        let config: StreamConfig = supported.with_sample_rate(SampleRate(sample_rate)).config();

        let gate = Arc::new(AtomicBool::new(true));
        let (tx, frames) = mpsc::unbounded_channel();

        let callback_gate = Arc::clone(&gate);
        let frame_size = settings.frame_size;
        let mut pending: Vec<f32> = Vec::with_capacity(frame_size);

        let stream = device
            .build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    if !callback_gate.load(Ordering::Acquire) {
                        pending.clear();
                        return;
                    }
                    pending.extend_from_slice(data);
                    while pending.len() >= frame_size {
                        let samples: Vec<f32> = pending.drain(..frame_size).collect();
                        let _ = tx.send(AudioFrame::new(samples, sample_rate));
                    }
                },
                |err| {
                    error!("audio capture error: {err}");
                },
                None,
            )
            .map_err(|e| PipelineError::Device(e.to_string()))?;

        stream.play().map_err(|e| PipelineError::Device(e.to_string()))?;

        debug!(
            device = device.name().unwrap_or_default(),
            sample_rate,
            frame_size,
            "audio capture started"
        );

        Ok(Self {
            _stream: stream,
            gate,
            frames,
            sample_rate,
        })
    }

    /// Next captured frame, or `None` if the stream has gone away.
    pub async fn next_frame(&mut self) -> Option<AudioFrame> {
        self.frames.recv().await
    }

    /// Stop delivering frames. Audio arriving while paused is dropped.
    pub fn pause(&self) {
        self.gate.store(false, Ordering::Release);
        debug!("capture paused");
    }

    /// Resume frame delivery, discarding anything queued while paused.
    pub fn resume(&mut self) {
        while self.frames.try_recv().is_ok() {}
        self.gate.store(true, Ordering::Release);
        debug!("capture resumed");
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}
