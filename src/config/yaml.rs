use serde::Deserialize;
use std::path::PathBuf;

use super::AppConfig;

/// Complete YAML configuration structure
///
/// All fields are optional to allow partial configuration; anything left
/// unset keeps its default, and environment variables can override any value
/// specified here.
///
/// # Example YAML structure
/// ```yaml
/// audio:
///   sample_rate: 16000
///   channels: 1
///   frame_size: 512
///
/// vad:
///   silence_threshold: 0.01
///   silence_duration_ms: 2000
///   min_utterance_ms: 300
///   max_utterance_ms: 30000
///
/// timeouts:
///   recognition_secs: 10
///   generation_secs: 30
///   synthesis_secs: 60
///
/// tts_client:
///   base_url: "http://127.0.0.1:8888"
///   poll_interval_ms: 200
///   backoff_factor: 1.5
///   max_poll_interval_ms: 2000
///
/// service:
///   host: "127.0.0.1"
///   port: 8888
///   queue_depth: 16
///   retention_secs: 60
///   sync_timeout_secs: 60
///   max_text_len: 1000
///
/// conversation:
///   max_history_turns: 10
///   recognizer_url: "http://127.0.0.1:9000/recognize"
///   generator_url: "http://127.0.0.1:9001/generate"
///   greeting: "How can I help?"
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub audio: Option<AudioYaml>,
    pub vad: Option<VadYaml>,
    pub timeouts: Option<TimeoutsYaml>,
    pub tts_client: Option<TtsClientYaml>,
    pub service: Option<ServiceYaml>,
    pub conversation: Option<ConversationYaml>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AudioYaml {
    pub sample_rate: Option<u32>,
    pub channels: Option<u16>,
    pub frame_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct VadYaml {
    pub silence_threshold: Option<f32>,
    pub silence_duration_ms: Option<u64>,
    pub min_utterance_ms: Option<u64>,
    pub max_utterance_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TimeoutsYaml {
    pub recognition_secs: Option<u64>,
    pub generation_secs: Option<u64>,
    pub synthesis_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TtsClientYaml {
    pub base_url: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub backoff_factor: Option<f32>,
    pub max_poll_interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ServiceYaml {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub queue_depth: Option<usize>,
    pub retention_secs: Option<u64>,
    pub sync_timeout_secs: Option<u64>,
    pub max_text_len: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ConversationYaml {
    pub max_history_turns: Option<usize>,
    pub recognizer_url: Option<String>,
    pub generator_url: Option<String>,
    pub greeting: Option<String>,
}

macro_rules! overlay {
    ($section:expr, { $($field:ident => $target:expr),+ $(,)? }) => {
        if let Some(section) = $section {
            $(
                if let Some(value) = section.$field {
                    $target = value;
                }
            )+
        }
    };
}

impl YamlConfig {
    /// Load YAML configuration from a file.
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        let config: YamlConfig = serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))?;
        Ok(config)
    }

    /// Overlay every value present in the YAML onto `config`.
    pub fn apply(self, config: &mut AppConfig) {
        overlay!(self.audio, {
            sample_rate => config.audio.sample_rate,
            channels => config.audio.channels,
            frame_size => config.audio.frame_size,
        });
        overlay!(self.vad, {
            silence_threshold => config.vad.silence_threshold,
            silence_duration_ms => config.vad.silence_duration_ms,
            min_utterance_ms => config.vad.min_utterance_ms,
            max_utterance_ms => config.vad.max_utterance_ms,
        });
        overlay!(self.timeouts, {
            recognition_secs => config.timeouts.recognition_secs,
            generation_secs => config.timeouts.generation_secs,
            synthesis_secs => config.timeouts.synthesis_secs,
        });
        overlay!(self.tts_client, {
            base_url => config.tts_client.base_url,
            poll_interval_ms => config.tts_client.poll_interval_ms,
            backoff_factor => config.tts_client.backoff_factor,
            max_poll_interval_ms => config.tts_client.max_poll_interval_ms,
        });
        overlay!(self.service, {
            host => config.service.host,
            port => config.service.port,
            queue_depth => config.service.queue_depth,
            retention_secs => config.service.retention_secs,
            sync_timeout_secs => config.service.sync_timeout_secs,
            max_text_len => config.service.max_text_len,
        });
        if let Some(conversation) = self.conversation {
            if let Some(value) = conversation.max_history_turns {
                config.max_history_turns = value;
            }
            if let Some(value) = conversation.recognizer_url {
                config.recognizer_url = value;
            }
            if let Some(value) = conversation.generator_url {
                config.generator_url = value;
            }
            if conversation.greeting.is_some() {
                config.greeting = conversation.greeting;
            }
        }
    }
}
