//! Synthesis job service: the async broker between HTTP clients and the
//! slow, stateful synthesis engine.

mod broker;
mod engine;
mod job;

pub use broker::{BrokerSettings, JobBroker, JobView};
pub use engine::{ModelInfo, SynthesisEngine, ToneEngine};
pub use job::{JobStatus, SynthesisJob};
