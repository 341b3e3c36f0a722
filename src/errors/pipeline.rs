//! Error types for the conversation pipeline and the synthesis job broker.
//!
//! The orchestrator distinguishes fatal device failures from per-turn
//! failures: everything except [`PipelineError::Device`] is recovered by
//! dropping the current turn and returning to listening.

use uuid::Uuid;

/// Errors raised along the conversation pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PipelineError {
    /// Capture or playback device unavailable. Fatal: the process shuts
    /// down after cleanup.
    #[error("audio device error: {0}")]
    Device(String),

    /// Recognition failed or produced nothing usable. Recovered locally as
    /// a skipped turn.
    #[error("recognition failed: {0}")]
    Recognition(String),

    /// The reply generator failed. The turn is dropped and history is left
    /// unmodified for the cycle.
    #[error("generation failed: {0}")]
    Generation(String),

    /// No terminal synthesis status arrived within the client timeout.
    #[error("synthesis timed out after {0} ms")]
    SynthesisTimeout(u64),

    /// The synthesis service reported a failure.
    #[error("synthesis service error: {0}")]
    SynthesisService(String),

    /// A job id the client believed valid is unknown to the service.
    /// Surfaced to the caller, never retried.
    #[error("synthesis job not found: {0}")]
    JobNotFound(Uuid),
}

impl PipelineError {
    /// Whether the orchestrator may recover by returning to listening.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, PipelineError::Device(_))
    }
}

/// Errors surfaced by the synthesis client when talking to the job service.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SynthesisError {
    #[error("synthesis request failed: {0}")]
    Request(String),

    #[error("synthesis job {0} failed: {1}")]
    JobFailed(Uuid, String),

    #[error("job {0} not found on the service")]
    JobNotFound(Uuid),

    #[error("no terminal status within {0} ms")]
    Timeout(u64),

    #[error("malformed service response: {0}")]
    BadResponse(String),
}

impl From<SynthesisError> for PipelineError {
    fn from(err: SynthesisError) -> Self {
        match err {
            SynthesisError::Timeout(ms) => PipelineError::SynthesisTimeout(ms),
            SynthesisError::JobNotFound(id) => PipelineError::JobNotFound(id),
            other => PipelineError::SynthesisService(other.to_string()),
        }
    }
}

/// Errors raised by the synthesis job broker.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BrokerError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("text too long: {actual} characters (max {max})")]
    TextTooLong { actual: usize, max: usize },

    #[error("job queue is full (depth {0})")]
    QueueFull(usize),

    #[error("job {0} not found")]
    JobNotFound(Uuid),

    #[error("job {id} is already terminal ({status})")]
    AlreadyTerminal { id: Uuid, status: String },

    #[error("synthesis engine error: {0}")]
    Engine(String),

    #[error("server-side synthesis timed out after {0} ms")]
    Timeout(u64),
}
