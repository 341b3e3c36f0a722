pub mod app_error;
pub mod pipeline;

pub use app_error::{AppError, AppResult};
pub use pipeline::{BrokerError, PipelineError, SynthesisError};
