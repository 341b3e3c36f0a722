//! Audio device glue: capture and playback around the conversation cycle.

mod capture;
mod frame;
mod playback;

pub use capture::AudioCapture;
pub use frame::{AudioFrame, Utterance};
pub use playback::{AudioPlayback, AudioSink};
