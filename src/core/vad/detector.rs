//! Utterance boundary detection from frame energy.
//!
//! The detector classifies each incoming frame against an RMS threshold and
//! assembles complete utterances from the speech runs it finds.
//!
//! # State Transitions
//!
//! ```text
//! [Idle] ─── rms > threshold ──► [Speaking] (start boundary, buffering)
//!    ▲                               │
//!    │                               ├── rms <= threshold: silence timer runs
//!    │                               │     speech resuming cancels the timer
//!    │                               │
//!    └── silence >= silence_duration ┘  emit buffered utterance
//!        or buffered >= max_utterance   (end boundary = start of silence)
//! ```
//!
//! Utterances shorter than the configured minimum are dropped instead of
//! emitted. The detector is purely synchronous: given the same frame
//! sequence and thresholds it always produces the same boundaries.

use tracing::{debug, info};

use super::config::VadConfig;
use crate::core::audio::{AudioFrame, Utterance};

/// Result of feeding one frame to the detector.
#[derive(Debug)]
pub enum VadOutcome {
    /// Nothing to report yet; keep feeding frames.
    Continue,
    /// A complete utterance was detected and assembled.
    Utterance(Utterance),
}

/// Internal detector state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VadState {
    /// Below threshold, nothing buffered.
    Idle,
    /// Start boundary recorded, frames being buffered.
    Speaking,
}

/// Assembles utterances from a continuous frame stream.
///
/// Owned by the single orchestrator path, so plain mutable state suffices;
/// there is no concurrent access to guard against.
pub struct UtteranceDetector {
    config: VadConfig,
    state: VadState,

    /// Samples buffered since the start boundary, trailing silence included.
    buffer: Vec<f32>,
    /// Buffer length at the last speech frame. The end boundary on emission.
    speech_end: usize,
    /// Accumulated speech duration in the current segment (ms).
    speech_ms: f32,
    /// Accumulated silence since the last speech frame (ms).
    silence_ms: f32,

    sample_rate: u32,
}

impl UtteranceDetector {
    pub fn new(config: VadConfig, sample_rate: u32) -> Self {
        Self {
            config,
            state: VadState::Idle,
            buffer: Vec::new(),
            speech_end: 0,
            speech_ms: 0.0,
            silence_ms: 0.0,
            sample_rate,
        }
    }

    /// Feed one frame and return the detection outcome.
    pub fn observe(&mut self, frame: &AudioFrame) -> VadOutcome {
        let is_speech = frame.rms() > self.config.silence_threshold;
        let frame_ms = frame.duration_ms();

        match self.state {
            VadState::Idle => {
                if !is_speech {
                    return VadOutcome::Continue;
                }
                // Start boundary
                debug!("VAD: speech started");
                self.state = VadState::Speaking;
                self.buffer.extend_from_slice(&frame.samples);
                self.speech_end = self.buffer.len();
                self.speech_ms = frame_ms;
                self.silence_ms = 0.0;
                VadOutcome::Continue
            }
            VadState::Speaking => {
                self.buffer.extend_from_slice(&frame.samples);

                if is_speech {
                    if self.silence_ms > 0.0 {
                        debug!("VAD: speech resumed after {:.0}ms silence", self.silence_ms);
                    }
                    self.speech_ms += frame_ms;
                    self.silence_ms = 0.0;
                    self.speech_end = self.buffer.len();
                } else {
                    self.silence_ms += frame_ms;
                }

                if self.silence_ms >= self.config.silence_duration_ms as f32 {
                    // End boundary is the start of the closing silence
                    return self.finish(self.speech_end);
                }

                if self.buffered_ms() >= self.config.max_utterance_ms as f32 {
                    info!(
                        "VAD: max utterance duration reached ({}ms), forcing completion",
                        self.config.max_utterance_ms
                    );
                    let end = if self.silence_ms > 0.0 {
                        self.speech_end
                    } else {
                        self.buffer.len()
                    };
                    return self.finish(end);
                }

                VadOutcome::Continue
            }
        }
    }

    /// Close the current segment at `end` samples and reset for the next one.
    fn finish(&mut self, end: usize) -> VadOutcome {
        let mut samples = std::mem::take(&mut self.buffer);
        samples.truncate(end);
        let speech_ms = self.speech_ms;
        self.reset();

        if speech_ms < self.config.min_utterance_ms as f32 {
            debug!(
                "VAD: discarding short segment ({:.0}ms < {}ms minimum)",
                speech_ms, self.config.min_utterance_ms
            );
            return VadOutcome::Continue;
        }

        let utterance = Utterance::new(samples, self.sample_rate);
        info!(
            "VAD: utterance complete ({}ms buffered, {:.0}ms speech)",
            utterance.duration_ms(),
            speech_ms
        );
        VadOutcome::Utterance(utterance)
    }

    /// Clear all buffered state. Call between conversation cycles.
    pub fn reset(&mut self) {
        self.state = VadState::Idle;
        self.buffer.clear();
        self.speech_end = 0;
        self.speech_ms = 0.0;
        self.silence_ms = 0.0;
    }

    /// Whether the detector is currently inside a speech segment.
    pub fn is_speaking(&self) -> bool {
        self.state == VadState::Speaking
    }

    /// Total duration currently buffered, trailing silence included (ms).
    fn buffered_ms(&self) -> f32 {
        (self.buffer.len() as f32 / self.sample_rate as f32) * 1000.0
    }

    pub fn config(&self) -> &VadConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: u32 = 16000;
    const FRAME_SIZE: usize = 512; // 32ms at 16 kHz

    fn speech_frame() -> AudioFrame {
        AudioFrame::new(vec![0.5; FRAME_SIZE], SAMPLE_RATE)
    }

    fn silence_frame() -> AudioFrame {
        AudioFrame::new(vec![0.0; FRAME_SIZE], SAMPLE_RATE)
    }

    fn detector() -> UtteranceDetector {
        let config = VadConfig::default()
            .with_threshold(0.01)
            .with_silence_duration_ms(320) // 10 frames
            .with_min_utterance_ms(100)
            .with_max_utterance_ms(10_000);
        UtteranceDetector::new(config, SAMPLE_RATE)
    }

    fn feed(detector: &mut UtteranceDetector, frame: &AudioFrame, count: usize) -> Option<Utterance> {
        for _ in 0..count {
            if let VadOutcome::Utterance(u) = detector.observe(frame) {
                return Some(u);
            }
        }
        None
    }

    #[test]
    fn test_pure_silence_emits_nothing() {
        let mut det = detector();
        assert!(feed(&mut det, &silence_frame(), 1000).is_none());
        assert!(!det.is_speaking());
    }

    #[test]
    fn test_speech_then_silence_emits_one_utterance() {
        let mut det = detector();

        // 20 frames of speech (~640ms), no emission yet
        assert!(feed(&mut det, &speech_frame(), 20).is_none());
        assert!(det.is_speaking());

        // Silence closes the utterance after the configured duration
        let utterance = feed(&mut det, &silence_frame(), 20).expect("utterance expected");

        // End boundary at the start of silence: exactly the speech samples
        assert_eq!(utterance.samples.len(), 20 * FRAME_SIZE);
        assert!(!det.is_speaking());

        // Further silence emits nothing
        assert!(feed(&mut det, &silence_frame(), 100).is_none());
    }

    #[test]
    fn test_short_burst_discarded() {
        let mut det = detector();

        // 2 frames (~64ms) is below the 100ms minimum
        assert!(feed(&mut det, &speech_frame(), 2).is_none());
        assert!(feed(&mut det, &silence_frame(), 30).is_none());
    }

    #[test]
    fn test_brief_pause_does_not_split_utterance() {
        let mut det = detector();

        feed(&mut det, &speech_frame(), 10);
        // 5 frames of silence (~160ms) is below the 320ms closing duration
        assert!(feed(&mut det, &silence_frame(), 5).is_none());
        // Speech resumes, timer cancelled
        feed(&mut det, &speech_frame(), 10);

        let utterance = feed(&mut det, &silence_frame(), 20).expect("utterance expected");
        // All three runs are buffered into a single utterance
        assert_eq!(utterance.samples.len(), 25 * FRAME_SIZE);
    }

    #[test]
    fn test_max_duration_forces_completion() {
        let config = VadConfig::default()
            .with_silence_duration_ms(320)
            .with_min_utterance_ms(100)
            .with_max_utterance_ms(640); // 20 frames
        let mut det = UtteranceDetector::new(config, SAMPLE_RATE);

        // Continuous speech, never any silence
        let utterance = feed(&mut det, &speech_frame(), 100).expect("forced completion expected");
        assert_eq!(utterance.samples.len(), 20 * FRAME_SIZE);
        assert!(!det.is_speaking());
    }

    #[test]
    fn test_reset_clears_partial_segment() {
        let mut det = detector();
        feed(&mut det, &speech_frame(), 10);
        assert!(det.is_speaking());

        det.reset();
        assert!(!det.is_speaking());
        // The paused segment never surfaces
        assert!(feed(&mut det, &silence_frame(), 50).is_none());
    }
}
