//! Integration tests for energy-based utterance detection
//!
//! These tests verify the VAD system works correctly as a whole,
//! including boundary placement and configuration handling.

use voxloop::config::AppConfig;
use voxloop::core::audio::AudioFrame;
use voxloop::core::vad::{UtteranceDetector, VadConfig, VadOutcome};

const SAMPLE_RATE: u32 = 16000;
const FRAME_SIZE: usize = 512; // 32ms at 16 kHz

/// Synthetic speech-like audio: a sine sweep with RMS well above threshold.
fn speech_samples(n: usize) -> Vec<f32> {
    use std::f32::consts::PI;
    (0..n)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let freq = 220.0 + (t * 40.0).sin() * 60.0;
            (2.0 * PI * freq * t).sin() * 0.4
        })
        .collect()
}

/// Low-level noise floor, below any sensible threshold.
fn noise_samples(n: usize) -> Vec<f32> {
    (0..n).map(|i| if i % 2 == 0 { 0.002 } else { -0.002 }).collect()
}

fn frames_of(samples: Vec<f32>) -> Vec<AudioFrame> {
    samples
        .chunks(FRAME_SIZE)
        .filter(|c| c.len() == FRAME_SIZE)
        .map(|c| AudioFrame::new(c.to_vec(), SAMPLE_RATE))
        .collect()
}

fn feed_all(detector: &mut UtteranceDetector, frames: &[AudioFrame]) -> Vec<VadOutcome> {
    frames.iter().map(|f| detector.observe(f)).collect()
}

fn default_detector() -> UtteranceDetector {
    let settings = AppConfig::default().vad;
    UtteranceDetector::new(VadConfig::from_settings(&settings), SAMPLE_RATE)
}

/// Test that the detector emits one utterance for speech followed by silence
#[test]
fn test_utterance_detection_end_to_end() {
    let mut detector = default_detector();

    // ~1s of synthetic speech
    let speech = frames_of(speech_samples(SAMPLE_RATE as usize));
    for outcome in feed_all(&mut detector, &speech) {
        assert!(matches!(outcome, VadOutcome::Continue));
    }
    assert!(detector.is_speaking());

    // ~2.5s of noise floor closes the segment (default silence 2000ms)
    let silence = frames_of(noise_samples(SAMPLE_RATE as usize * 5 / 2));
    let mut emitted = None;
    for outcome in feed_all(&mut detector, &silence) {
        if let VadOutcome::Utterance(u) = outcome {
            assert!(emitted.is_none(), "only one utterance per segment");
            emitted = Some(u);
        }
    }

    let utterance = emitted.expect("utterance should be emitted after silence");
    // End boundary sits at the start of the closing silence, so the emitted
    // samples are exactly the speech frames
    assert_eq!(utterance.samples.len(), speech.len() * FRAME_SIZE);
    assert_eq!(utterance.sample_rate, SAMPLE_RATE);
    assert!(!detector.is_speaking());
}

/// Test that the noise floor alone never produces an utterance
#[test]
fn test_noise_floor_never_emits() {
    let mut detector = default_detector();

    let noise = frames_of(noise_samples(SAMPLE_RATE as usize * 10));
    for outcome in feed_all(&mut detector, &noise) {
        assert!(matches!(outcome, VadOutcome::Continue));
    }
    assert!(!detector.is_speaking());
}

/// Test default settings match the expected tuning
#[test]
fn test_config_from_default_settings() {
    let settings = AppConfig::default().vad;
    let config = VadConfig::from_settings(&settings);

    assert_eq!(config.silence_threshold, 0.01);
    assert_eq!(config.silence_duration_ms, 2000);
    assert_eq!(config.min_utterance_ms, 300);
    assert_eq!(config.max_utterance_ms, 30_000);
}

/// Test config builder pattern
#[test]
fn test_config_builder_chain() {
    let config = VadConfig::default()
        .with_threshold(0.05)
        .with_silence_duration_ms(400)
        .with_min_utterance_ms(150)
        .with_max_utterance_ms(5000);

    assert_eq!(config.silence_threshold, 0.05);
    assert_eq!(config.silence_duration_ms, 400);
    assert_eq!(config.min_utterance_ms, 150);
    assert_eq!(config.max_utterance_ms, 5000);
}

/// Test multiple speech segments with reset between them
#[test]
fn test_multiple_segments_with_reset() {
    let config = VadConfig::default()
        .with_silence_duration_ms(128) // 4 frames for faster testing
        .with_min_utterance_ms(64);
    let mut detector = UtteranceDetector::new(config, SAMPLE_RATE);

    for _ in 0..3 {
        let speech = frames_of(speech_samples(FRAME_SIZE * 10));
        feed_all(&mut detector, &speech);
        assert!(detector.is_speaking());

        let silence = frames_of(noise_samples(FRAME_SIZE * 8));
        let emitted = feed_all(&mut detector, &silence)
            .into_iter()
            .any(|o| matches!(o, VadOutcome::Utterance(_)));
        assert!(emitted, "each segment emits independently");

        // Mirrors what the orchestrator does between cycles
        detector.reset();
        assert!(!detector.is_speaking());
    }
}

/// Test realistic conversation turn: speech, thinking pause, more speech
#[test]
fn test_realistic_turn_with_mid_pause() {
    let config = VadConfig::default()
        .with_silence_duration_ms(320) // 10 frames
        .with_min_utterance_ms(100);
    let mut detector = UtteranceDetector::new(config, SAMPLE_RATE);

    // "Hello" (~320ms)
    let first = frames_of(speech_samples(FRAME_SIZE * 10));
    feed_all(&mut detector, &first);

    // Thinking pause (~160ms) stays under the closing duration
    let pause = frames_of(noise_samples(FRAME_SIZE * 5));
    for outcome in feed_all(&mut detector, &pause) {
        assert!(matches!(outcome, VadOutcome::Continue));
    }
    assert!(detector.is_speaking());

    // "my name is..." (~480ms)
    let second = frames_of(speech_samples(FRAME_SIZE * 15));
    feed_all(&mut detector, &second);

    // Turn ends after real silence
    let closing = frames_of(noise_samples(FRAME_SIZE * 15));
    let utterance = feed_all(&mut detector, &closing)
        .into_iter()
        .find_map(|o| match o {
            VadOutcome::Utterance(u) => Some(u),
            VadOutcome::Continue => None,
        })
        .expect("turn should end after closing silence");

    // Both speech runs and the mid-pause are one utterance
    assert_eq!(utterance.samples.len(), 30 * FRAME_SIZE);
}

/// Test a cough-length burst is discarded, then a real turn still works
#[test]
fn test_short_burst_then_real_turn() {
    let config = VadConfig::default()
        .with_silence_duration_ms(128)
        .with_min_utterance_ms(300);
    let mut detector = UtteranceDetector::new(config, SAMPLE_RATE);

    // 2 frames (~64ms) of burst, then silence: below minimum, discarded
    let burst = frames_of(speech_samples(FRAME_SIZE * 2));
    feed_all(&mut detector, &burst);
    let silence = frames_of(noise_samples(FRAME_SIZE * 6));
    for outcome in feed_all(&mut detector, &silence) {
        assert!(matches!(outcome, VadOutcome::Continue));
    }

    // A real utterance afterwards is unaffected
    let speech = frames_of(speech_samples(FRAME_SIZE * 20));
    feed_all(&mut detector, &speech);
    let closing = frames_of(noise_samples(FRAME_SIZE * 6));
    let emitted = feed_all(&mut detector, &closing)
        .into_iter()
        .any(|o| matches!(o, VadOutcome::Utterance(_)));
    assert!(emitted);
}

/// Test runaway speech is force-completed at the maximum duration
#[test]
fn test_max_duration_cap() {
    let config = VadConfig::default()
        .with_silence_duration_ms(2000)
        .with_min_utterance_ms(100)
        .with_max_utterance_ms(1000);
    let mut detector = UtteranceDetector::new(config, SAMPLE_RATE);

    // 3s of uninterrupted speech; the cap fires at 1s
    let speech = frames_of(speech_samples(SAMPLE_RATE as usize * 3));
    let utterance = feed_all(&mut detector, &speech)
        .into_iter()
        .find_map(|o| match o {
            VadOutcome::Utterance(u) => Some(u),
            VadOutcome::Continue => None,
        })
        .expect("cap should force completion");

    assert!(utterance.duration_ms() <= 1100);
    assert!(utterance.duration_ms() >= 900);
}

/// Test determinism: identical frame sequences give identical boundaries
#[test]
fn test_deterministic_boundaries() {
    let run = || {
        let mut detector = default_detector();
        let mut sequence = frames_of(speech_samples(SAMPLE_RATE as usize));
        sequence.extend(frames_of(noise_samples(SAMPLE_RATE as usize * 3)));
        feed_all(&mut detector, &sequence)
            .into_iter()
            .find_map(|o| match o {
                VadOutcome::Utterance(u) => Some(u.samples.len()),
                VadOutcome::Continue => None,
            })
    };

    let first = run();
    let second = run();
    assert!(first.is_some());
    assert_eq!(first, second);
}
