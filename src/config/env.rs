use std::env;
use std::str::FromStr;

use super::AppConfig;

/// Read one `VOXLOOP_*` variable and parse it, reporting the variable name
/// on failure.
fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, String>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| format!("Invalid value for {name}: {e}")),
        Err(_) => Ok(None),
    }
}

macro_rules! override_from_env {
    ($({ $name:literal => $target:expr }),+ $(,)?) => {
        $(
            if let Some(value) = parse_var($name)? {
                $target = value;
            }
        )+
    };
}

/// Apply `VOXLOOP_*` environment variable overrides onto `config`.
///
/// Unset variables leave the existing value untouched. Malformed values are
/// an error rather than a silent fallback.
pub fn apply_env(config: &mut AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    override_from_env!(
        // Audio stream
        { "VOXLOOP_SAMPLE_RATE" => config.audio.sample_rate },
        { "VOXLOOP_CHANNELS" => config.audio.channels },
        { "VOXLOOP_FRAME_SIZE" => config.audio.frame_size },
        // VAD
        { "VOXLOOP_SILENCE_THRESHOLD" => config.vad.silence_threshold },
        { "VOXLOOP_SILENCE_DURATION_MS" => config.vad.silence_duration_ms },
        { "VOXLOOP_MIN_UTTERANCE_MS" => config.vad.min_utterance_ms },
        { "VOXLOOP_MAX_UTTERANCE_MS" => config.vad.max_utterance_ms },
        // Stage timeouts
        { "VOXLOOP_RECOGNITION_TIMEOUT_SECS" => config.timeouts.recognition_secs },
        { "VOXLOOP_GENERATION_TIMEOUT_SECS" => config.timeouts.generation_secs },
        { "VOXLOOP_SYNTHESIS_TIMEOUT_SECS" => config.timeouts.synthesis_secs },
        // Synthesis client
        { "VOXLOOP_TTS_URL" => config.tts_client.base_url },
        { "VOXLOOP_POLL_INTERVAL_MS" => config.tts_client.poll_interval_ms },
        { "VOXLOOP_BACKOFF_FACTOR" => config.tts_client.backoff_factor },
        { "VOXLOOP_MAX_POLL_INTERVAL_MS" => config.tts_client.max_poll_interval_ms },
        // Job service
        { "VOXLOOP_SERVICE_HOST" => config.service.host },
        { "VOXLOOP_SERVICE_PORT" => config.service.port },
        { "VOXLOOP_QUEUE_DEPTH" => config.service.queue_depth },
        { "VOXLOOP_RETENTION_SECS" => config.service.retention_secs },
        { "VOXLOOP_SYNC_TIMEOUT_SECS" => config.service.sync_timeout_secs },
        { "VOXLOOP_MAX_TEXT_LEN" => config.service.max_text_len },
        // Conversation
        { "VOXLOOP_MAX_HISTORY_TURNS" => config.max_history_turns },
        { "VOXLOOP_RECOGNIZER_URL" => config.recognizer_url },
        { "VOXLOOP_GENERATOR_URL" => config.generator_url },
    );

    if let Ok(greeting) = env::var("VOXLOOP_GREETING") {
        config.greeting = if greeting.trim().is_empty() {
            None
        } else {
            Some(greeting)
        };
    }

    Ok(())
}
