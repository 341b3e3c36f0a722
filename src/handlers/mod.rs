pub mod api;
pub mod tts;
