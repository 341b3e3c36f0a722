//! Audio sample containers shared between capture, VAD, and recognition.

/// One fixed-duration block of mono PCM samples from the capture stream.
///
/// Frames are ephemeral: the capture callback produces them and the VAD
/// consumes them immediately.
#[derive(Debug, Clone)]
pub struct AudioFrame {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Root-mean-square energy of the frame, in [0, 1] for normalized PCM.
    pub fn rms(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_sq: f32 = self.samples.iter().map(|s| s * s).sum();
        (sum_sq / self.samples.len() as f32).sqrt()
    }

    /// Frame duration in milliseconds.
    pub fn duration_ms(&self) -> f32 {
        (self.samples.len() as f32 / self.sample_rate as f32) * 1000.0
    }
}

/// One complete unit of detected user speech, bounded by VAD start/end.
///
/// Owned exclusively by the detector until handed to recognition, then
/// discarded.
#[derive(Debug, Clone)]
pub struct Utterance {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Utterance {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Utterance duration in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000) / self.sample_rate as u64
    }
}
