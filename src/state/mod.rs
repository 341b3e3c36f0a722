use std::sync::Arc;

use crate::config::AppConfig;
use crate::service::{BrokerSettings, JobBroker, SynthesisEngine};

/// Application state shared across the synthesis service handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    /// The job broker owning the queue, store, and worker.
    pub broker: Arc<JobBroker>,
}

impl AppState {
    /// Build state and start the broker's worker and reclamation tasks.
    pub fn new(config: AppConfig, engine: Box<dyn SynthesisEngine>) -> Arc<Self> {
        let broker = JobBroker::spawn(BrokerSettings::from(&config.service), engine);
        Arc::new(Self { config, broker })
    }
}
