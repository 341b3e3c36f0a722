//! Voice-activity detection.
//!
//! Energy-based utterance boundary detection over the capture frame stream.

mod config;
mod detector;

pub use config::VadConfig;
pub use detector::{UtteranceDetector, VadOutcome};
