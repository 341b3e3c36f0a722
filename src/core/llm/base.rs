//! Reply generation collaborator interface.
//!
//! Language-model internals live behind this trait: the orchestrator only
//! sees `generate(text, history) -> reply`.

use async_trait::async_trait;

use crate::core::history::ConversationTurn;
use crate::errors::PipelineError;

/// Opaque generate(text, history) -> text capability.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Produce a reply to `text` given the recent conversation context.
    ///
    /// `history` is a snapshot; the generator must not assume it can
    /// observe turns appended after this call.
    async fn generate(
        &self,
        text: &str,
        history: &[ConversationTurn],
    ) -> Result<String, PipelineError>;
}
