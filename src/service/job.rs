//! Synthesis job lifecycle.
//!
//! Each job moves through `queued → running → completed | failed`. Every
//! transition fires exactly once and terminal states are final: once a job
//! completes or fails, reads of its status are idempotent.

use std::fmt;
use std::time::Instant;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::BrokerError;

/// Lifecycle status of a synthesis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether this status is final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// Whether the state machine allows `self -> next`.
    fn allows(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Running)
                | (JobStatus::Running, JobStatus::Completed)
                | (JobStatus::Running, JobStatus::Failed)
        )
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One asynchronous unit of synthesis work tracked by id.
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    pub id: Uuid,
    pub text: String,
    pub status: JobStatus,
    /// Synthesized audio, set on completion.
    pub result: Option<Bytes>,
    /// Failure reason, set on failure.
    pub error: Option<String>,
    pub created_at: Instant,
    pub updated_at: Instant,
}

impl SynthesisJob {
    pub fn new(text: impl Into<String>) -> Self {
        let now = Instant::now();
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            status: JobStatus::Queued,
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn transition(&mut self, next: JobStatus) -> Result<(), BrokerError> {
        if !self.status.allows(next) {
            return Err(BrokerError::AlreadyTerminal {
                id: self.id,
                status: self.status.to_string(),
            });
        }
        self.status = next;
        self.updated_at = Instant::now();
        Ok(())
    }

    /// Mark the job as picked up by a worker.
    pub fn mark_running(&mut self) -> Result<(), BrokerError> {
        self.transition(JobStatus::Running)
    }

    /// Record successful synthesis output.
    pub fn complete(&mut self, audio: Bytes) -> Result<(), BrokerError> {
        self.transition(JobStatus::Completed)?;
        self.result = Some(audio);
        Ok(())
    }

    /// Record an engine failure.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), BrokerError> {
        self.transition(JobStatus::Failed)?;
        self.error = Some(reason.into());
        Ok(())
    }
}
