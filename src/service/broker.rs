//! Asynchronous synthesis job broker.
//!
//! Decouples client request latency from the synthesis engine's throughput:
//! `submit` returns immediately with a job id, a worker task drains a
//! bounded FIFO queue against its exclusively-owned engine, and terminal
//! jobs are retained for a bounded window before a reclamation task removes
//! them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::engine::{ModelInfo, SynthesisEngine};
use super::job::{JobStatus, SynthesisJob};
use crate::config::ServiceSettings;
use crate::errors::BrokerError;

/// Broker limits and policies.
#[derive(Debug, Clone)]
pub struct BrokerSettings {
    /// Bounded queue depth; submissions beyond it are rejected.
    pub queue_depth: usize,
    /// How long terminal jobs stay queryable before reclamation.
    pub retention: Duration,
    /// Server-side cap for the synchronous synthesize path.
    pub sync_timeout: Duration,
    /// Maximum accepted text length in characters.
    pub max_text_len: usize,
}

impl From<&ServiceSettings> for BrokerSettings {
    fn from(settings: &ServiceSettings) -> Self {
        Self {
            queue_depth: settings.queue_depth,
            retention: settings.retention(),
            sync_timeout: Duration::from_secs(settings.sync_timeout_secs),
            max_text_len: settings.max_text_len,
        }
    }
}

/// Caller-facing snapshot of a job.
#[derive(Debug, Clone)]
pub struct JobView {
    pub id: Uuid,
    pub status: JobStatus,
    pub result: Option<Bytes>,
    pub error: Option<String>,
}

struct JobEntry {
    job: SynthesisJob,
    /// Completion notification channel; carries every status change.
    notify: watch::Sender<JobStatus>,
}

/// The job store plus queue feeding the worker.
pub struct JobBroker {
    jobs: RwLock<HashMap<Uuid, JobEntry>>,
    queue_tx: mpsc::Sender<Uuid>,
    settings: BrokerSettings,
    model_info: ModelInfo,
}

impl JobBroker {
    /// Create the broker and spawn its worker and reclamation tasks.
    ///
    /// The engine moves into the worker task and is never shared; exactly
    /// one job runs against it at a time.
    pub fn spawn(settings: BrokerSettings, engine: Box<dyn SynthesisEngine>) -> Arc<Self> {
        let (queue_tx, queue_rx) = mpsc::channel(settings.queue_depth);
        let model_info = engine.info();

        let broker = Arc::new(Self {
            jobs: RwLock::new(HashMap::new()),
            queue_tx,
            settings,
            model_info,
        });

        tokio::spawn(worker_loop(Arc::clone(&broker), queue_rx, engine));
        tokio::spawn(reclaim_loop(Arc::clone(&broker)));

        broker
    }

    /// Create a job in `queued` state and enqueue it. Non-blocking.
    ///
    /// Validation happens before a job exists: empty or oversized text never
    /// produces an id.
    pub fn submit(&self, text: &str) -> Result<Uuid, BrokerError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BrokerError::EmptyText);
        }
        let len = text.chars().count();
        if len > self.settings.max_text_len {
            return Err(BrokerError::TextTooLong {
                actual: len,
                max: self.settings.max_text_len,
            });
        }

        let job = SynthesisJob::new(text);
        let id = job.id;
        let (notify, _) = watch::channel(JobStatus::Queued);
        self.jobs.write().insert(id, JobEntry { job, notify });

        if self.queue_tx.try_send(id).is_err() {
            self.jobs.write().remove(&id);
            warn!(job_id = %id, "job queue full, rejecting submission");
            return Err(BrokerError::QueueFull(self.settings.queue_depth));
        }

        info!(job_id = %id, chars = len, "synthesis job queued");
        Ok(id)
    }

    /// Read-only status query. Reclaimed or never-created ids are an error
    /// distinct from "not yet complete".
    pub fn status(&self, id: Uuid) -> Result<JobView, BrokerError> {
        let jobs = self.jobs.read();
        let entry = jobs.get(&id).ok_or(BrokerError::JobNotFound(id))?;
        Ok(JobView {
            id,
            status: entry.job.status,
            result: entry.job.result.clone(),
            error: entry.job.error.clone(),
        })
    }

    /// Wait until the job reaches a terminal status, up to `timeout`.
    pub async fn wait(&self, id: Uuid, timeout: Duration) -> Result<JobView, BrokerError> {
        let mut rx = {
            let jobs = self.jobs.read();
            let entry = jobs.get(&id).ok_or(BrokerError::JobNotFound(id))?;
            entry.notify.subscribe()
        };

        let waited = tokio::time::timeout(timeout, async {
            loop {
                if rx.borrow_and_update().is_terminal() {
                    return Ok::<(), BrokerError>(());
                }
                if rx.changed().await.is_err() {
                    // Sender dropped with the entry: reclaimed mid-wait
                    return Err(BrokerError::JobNotFound(id));
                }
            }
        })
        .await;

        match waited {
            Ok(Ok(())) => self.status(id),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BrokerError::Timeout(timeout.as_millis() as u64)),
        }
    }

    /// Synchronous convenience path: submit and wait server-side.
    ///
    /// Respects the configured sync timeout rather than blocking
    /// indefinitely.
    pub async fn synthesize(&self, text: &str) -> Result<Bytes, BrokerError> {
        let id = self.submit(text)?;
        let view = self.wait(id, self.settings.sync_timeout).await?;

        match view.status {
            JobStatus::Completed => view
                .result
                .ok_or_else(|| BrokerError::Engine("completed job missing audio".to_string())),
            JobStatus::Failed => Err(BrokerError::Engine(
                view.error.unwrap_or_else(|| "unknown engine failure".to_string()),
            )),
            other => Err(BrokerError::Engine(format!(
                "job settled in non-terminal state {other}"
            ))),
        }
    }

    /// Metadata of the engine behind this broker.
    pub fn model_info(&self) -> &ModelInfo {
        &self.model_info
    }

    /// Number of jobs currently tracked, any status.
    pub fn job_count(&self) -> usize {
        self.jobs.read().len()
    }

    fn with_entry<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut JobEntry) -> R,
    ) -> Option<R> {
        let mut jobs = self.jobs.write();
        jobs.get_mut(&id).map(f)
    }

    /// Drop terminal jobs older than the retention window.
    fn reclaim_expired(&self) {
        let retention = self.settings.retention;
        let mut jobs = self.jobs.write();
        let before = jobs.len();
        jobs.retain(|_, entry| {
            !entry.job.status.is_terminal() || entry.job.updated_at.elapsed() < retention
        });
        let reclaimed = before - jobs.len();
        if reclaimed > 0 {
            debug!(reclaimed, "reclaimed expired synthesis jobs");
        }
    }
}

/// Single worker: pulls queued jobs FIFO and runs them one at a time
/// against its own engine.
async fn worker_loop(
    broker: Arc<JobBroker>,
    mut queue_rx: mpsc::Receiver<Uuid>,
    mut engine: Box<dyn SynthesisEngine>,
) {
    info!(engine = %engine.info().name, "synthesis worker started");

    while let Some(id) = queue_rx.recv().await {
        let text = match broker.with_entry(id, |entry| {
            entry.job.mark_running()?;
            entry.notify.send_replace(JobStatus::Running);
            Ok::<String, BrokerError>(entry.job.text.clone())
        }) {
            Some(Ok(text)) => text,
            Some(Err(e)) => {
                error!(job_id = %id, "refusing to run job: {e}");
                continue;
            }
            None => {
                // Reclaimed while still queued
                warn!(job_id = %id, "queued job vanished before pickup");
                continue;
            }
        };

        debug!(job_id = %id, "synthesis started");
        let outcome = engine.synthesize(&text).await;

        broker.with_entry(id, |entry| {
            let applied = match outcome {
                Ok(audio) => {
                    info!(job_id = %id, bytes = audio.len(), "synthesis completed");
                    entry.job.complete(audio)
                }
                Err(e) => {
                    error!(job_id = %id, "synthesis failed: {e}");
                    entry.job.fail(e.to_string())
                }
            };
            if let Err(e) = applied {
                error!(job_id = %id, "could not record job outcome: {e}");
            }
            entry.notify.send_replace(entry.job.status);
        });
    }
}

/// Periodic garbage collection of terminal jobs past retention.
async fn reclaim_loop(broker: Arc<JobBroker>) {
    let tick = (broker.settings.retention / 4).max(Duration::from_millis(50));
    let mut interval = tokio::time::interval(tick);
    loop {
        interval.tick().await;
        broker.reclaim_expired();
    }
}
