use super::AppConfig;

/// Validate the merged configuration.
///
/// Runs after defaults, YAML, and environment overrides have all been
/// applied, so it sees the values the process will actually use.
pub fn validate(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    if config.audio.sample_rate == 0 {
        return Err("audio.sample_rate must be greater than zero".into());
    }
    if config.audio.frame_size == 0 {
        return Err("audio.frame_size must be greater than zero".into());
    }
    if config.audio.channels != 1 {
        return Err("audio.channels: only mono capture is supported".into());
    }
    if !(0.0..=1.0).contains(&config.vad.silence_threshold) {
        return Err("vad.silence_threshold must be within [0.0, 1.0]".into());
    }
    if config.vad.min_utterance_ms >= config.vad.max_utterance_ms {
        return Err("vad.min_utterance_ms must be below vad.max_utterance_ms".into());
    }
    if config.tts_client.backoff_factor < 1.0 {
        return Err("tts_client.backoff_factor must be at least 1.0".into());
    }
    if config.tts_client.poll_interval_ms == 0 {
        return Err("tts_client.poll_interval_ms must be greater than zero".into());
    }
    if config.service.queue_depth == 0 {
        return Err("service.queue_depth must be greater than zero".into());
    }
    if config.service.max_text_len == 0 {
        return Err("service.max_text_len must be greater than zero".into());
    }
    if config.max_history_turns == 0 {
        return Err("conversation.max_history_turns must be greater than zero".into());
    }

    Ok(())
}
