pub mod config;
pub mod core;
pub mod errors;
pub mod handlers;
pub mod routes;
pub mod service;
pub mod state;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use core::{ConversationOrchestrator, DialogueHistory, SynthesisClient};
pub use errors::{AppError, AppResult, BrokerError, PipelineError, SynthesisError};
pub use service::{JobBroker, JobStatus, SynthesisEngine, ToneEngine};
pub use state::AppState;
