//! Speech recognition collaborator interface.
//!
//! Recognition internals live behind this trait: the orchestrator only sees
//! `recognize(utterance) -> text`. Implementations may run locally or call a
//! remote service.

use async_trait::async_trait;

use crate::core::audio::Utterance;
use crate::errors::PipelineError;

/// Opaque recognize(audio) -> text capability.
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Transcribe one complete utterance.
    ///
    /// An empty string is a valid result and means "nothing intelligible";
    /// the orchestrator treats it as a skipped turn.
    async fn recognize(&self, utterance: &Utterance) -> Result<String, PipelineError>;
}
