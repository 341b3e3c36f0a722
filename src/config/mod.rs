//! Configuration for the voxloop orchestrator and synthesis service
//!
//! Configuration comes from two sources: a YAML file and environment
//! variables. Environment variables always override YAML values, which in
//! turn override built-in defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable overrides
//! - `validation`: Configuration validation logic
//!
//! # Example
//! ```rust,no_run
//! use voxloop::config::AppConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Defaults plus environment overrides
//! let config = AppConfig::from_env()?;
//!
//! // YAML file with environment overrides on top
//! let config = AppConfig::from_file(&PathBuf::from("config.yaml"))?;
//!
//! println!("Synthesis service on {}", config.service.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

mod env;
mod validation;
mod yaml;

/// Microphone/speaker stream parameters, fixed for the process lifetime.
#[derive(Debug, Clone)]
pub struct AudioSettings {
    /// Sample rate in Hz. 16 kHz is the usual choice for speech pipelines.
    pub sample_rate: u32,
    /// Channel count. The pipeline is mono end to end.
    pub channels: u16,
    /// Samples per frame handed to the VAD.
    pub frame_size: usize,
}

impl AudioSettings {
    /// Duration of one frame in milliseconds.
    pub fn frame_duration_ms(&self) -> f32 {
        (self.frame_size as f32 / self.sample_rate as f32) * 1000.0
    }
}

/// Voice-activity detection parameters.
#[derive(Debug, Clone)]
pub struct VadSettings {
    /// RMS energy threshold separating speech from silence.
    pub silence_threshold: f32,
    /// Continuous silence required to close an utterance (ms).
    pub silence_duration_ms: u64,
    /// Utterances shorter than this are discarded as noise (ms).
    pub min_utterance_ms: u64,
    /// Hard cap on utterance length; forces completion without silence (ms).
    pub max_utterance_ms: u64,
}

/// Per-stage timeouts for cross-boundary calls.
#[derive(Debug, Clone)]
pub struct TimeoutSettings {
    pub recognition_secs: u64,
    pub generation_secs: u64,
    pub synthesis_secs: u64,
}

impl TimeoutSettings {
    pub fn recognition(&self) -> Duration {
        Duration::from_secs(self.recognition_secs)
    }

    pub fn generation(&self) -> Duration {
        Duration::from_secs(self.generation_secs)
    }

    pub fn synthesis(&self) -> Duration {
        Duration::from_secs(self.synthesis_secs)
    }
}

/// Synthesis client settings: where the job service lives and how to poll it.
#[derive(Debug, Clone)]
pub struct TtsClientSettings {
    /// Base URL of the synthesis job service.
    pub base_url: String,
    /// Initial polling interval (ms).
    pub poll_interval_ms: u64,
    /// Multiplier applied to the interval after each poll (>= 1.0).
    pub backoff_factor: f32,
    /// Upper bound the interval never exceeds (ms).
    pub max_poll_interval_ms: u64,
}

/// Synthesis job service settings.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub host: String,
    pub port: u16,
    /// Bounded depth of the job queue.
    pub queue_depth: usize,
    /// How long terminal jobs are retained before reclamation (seconds).
    pub retention_secs: u64,
    /// Server-side timeout for the synchronous synthesize endpoint (seconds).
    pub sync_timeout_secs: u64,
    /// Maximum accepted text length in characters.
    pub max_text_len: usize,
}

impl ServiceSettings {
    /// Get the service bind address as "host:port".
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

/// Top-level configuration for both binaries.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub audio: AudioSettings,
    pub vad: VadSettings,
    pub timeouts: TimeoutSettings,
    pub tts_client: TtsClientSettings,
    pub service: ServiceSettings,

    /// Maximum dialogue turns kept as generation context.
    pub max_history_turns: usize,
    /// Speech recognition collaborator endpoint.
    pub recognizer_url: String,
    /// Reply generation collaborator endpoint.
    pub generator_url: String,
    /// Optional line spoken once before the first listening cycle.
    pub greeting: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            audio: AudioSettings {
                sample_rate: 16000,
                channels: 1,
                frame_size: 512,
            },
            vad: VadSettings {
                silence_threshold: 0.01,
                silence_duration_ms: 2000,
                min_utterance_ms: 300,
                max_utterance_ms: 30_000,
            },
            timeouts: TimeoutSettings {
                recognition_secs: 10,
                generation_secs: 30,
                synthesis_secs: 60,
            },
            tts_client: TtsClientSettings {
                base_url: "http://127.0.0.1:8888".to_string(),
                poll_interval_ms: 200,
                backoff_factor: 1.5,
                max_poll_interval_ms: 2000,
            },
            service: ServiceSettings {
                host: "127.0.0.1".to_string(),
                port: 8888,
                queue_depth: 16,
                retention_secs: 60,
                sync_timeout_secs: 60,
                max_text_len: 1000,
            },
            max_history_turns: 10,
            recognizer_url: "http://127.0.0.1:9000/recognize".to_string(),
            generator_url: "http://127.0.0.1:9001/generate".to_string(),
            greeting: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file with environment variable
    /// overrides.
    ///
    /// Priority order (highest to lowest):
    /// 1. Environment variables
    /// 2. YAML file values
    /// 3. Default values
    ///
    /// # Errors
    /// Returns an error if the YAML file cannot be read or parsed, if an
    /// environment variable has an invalid format, or if the final
    /// configuration fails validation.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;

        let mut config = AppConfig::default();
        yaml_config.apply(&mut config);
        env::apply_env(&mut config)?;

        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from defaults plus environment variables only.
    ///
    /// Also loads a `.env` file if one is present.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let _ = dotenvy::dotenv();

        let mut config = AppConfig::default();
        env::apply_env(&mut config)?;

        validation::validate(&config)?;
        Ok(config)
    }
}
