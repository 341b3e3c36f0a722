//! Configuration for energy-based voice-activity detection.

use crate::config::VadSettings;

/// Parameters controlling utterance boundary detection.
#[derive(Debug, Clone, Copy)]
pub struct VadConfig {
    /// RMS energy threshold (0.0 to 1.0).
    ///
    /// Frames whose energy exceeds this value are classified as speech.
    pub silence_threshold: f32,

    /// Continuous silence required to close an utterance (ms).
    ///
    /// Natural mid-sentence pauses are shorter than this, so the utterance
    /// keeps buffering until the speaker has actually stopped.
    pub silence_duration_ms: u64,

    /// Minimum utterance length (ms). Shorter runs are discarded as noise.
    pub min_utterance_ms: u64,

    /// Maximum utterance length (ms). Completion is forced at this point
    /// even without silence, bounding latency and buffer growth.
    pub max_utterance_ms: u64,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            silence_threshold: 0.01,
            silence_duration_ms: 2000,
            min_utterance_ms: 300,
            max_utterance_ms: 30_000,
        }
    }
}

impl VadConfig {
    /// Build a detector config from the application settings.
    pub fn from_settings(settings: &VadSettings) -> Self {
        Self {
            silence_threshold: settings.silence_threshold,
            silence_duration_ms: settings.silence_duration_ms,
            min_utterance_ms: settings.min_utterance_ms,
            max_utterance_ms: settings.max_utterance_ms,
        }
    }

    /// Create a new config with the specified energy threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.silence_threshold = threshold;
        self
    }

    /// Create a new config with the specified closing-silence duration.
    pub fn with_silence_duration_ms(mut self, duration_ms: u64) -> Self {
        self.silence_duration_ms = duration_ms;
        self
    }

    /// Create a new config with the specified minimum utterance duration.
    pub fn with_min_utterance_ms(mut self, duration_ms: u64) -> Self {
        self.min_utterance_ms = duration_ms;
        self
    }

    /// Create a new config with the specified maximum utterance duration.
    pub fn with_max_utterance_ms(mut self, duration_ms: u64) -> Self {
        self.max_utterance_ms = duration_ms;
        self
    }
}
