//! Core conversation pipeline: audio, VAD, collaborators, and the
//! orchestrator tying them together.

pub mod asr;
pub mod audio;
pub mod history;
pub mod llm;
pub mod orchestrator;
pub mod tts_client;
pub mod vad;

pub use history::{ConversationTurn, DialogueHistory, Speaker};
pub use orchestrator::{ConversationOrchestrator, CycleOutcome, OrchestratorState};
pub use tts_client::{SpeechSynthesizer, SynthesisClient};
