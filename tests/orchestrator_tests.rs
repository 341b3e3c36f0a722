//! Orchestrator cycle tests with mock collaborators.
//!
//! These verify turn sequencing and the drop-and-resume failure policy
//! without real devices or services.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use voxloop::config::TimeoutSettings;
use voxloop::core::asr::SpeechRecognizer;
use voxloop::core::audio::{AudioSink, Utterance};
use voxloop::core::llm::ReplyGenerator;
use voxloop::core::tts_client::SpeechSynthesizer;
use voxloop::core::{ConversationOrchestrator, ConversationTurn, CycleOutcome, Speaker};
use voxloop::errors::{PipelineError, SynthesisError};
use voxloop::DialogueHistory;

struct FixedRecognizer(String);

#[async_trait]
impl SpeechRecognizer for FixedRecognizer {
    async fn recognize(&self, _utterance: &Utterance) -> Result<String, PipelineError> {
        Ok(self.0.clone())
    }
}

struct EchoGenerator {
    reply: String,
    seen_context: Mutex<Vec<usize>>,
}

impl EchoGenerator {
    fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            seen_context: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ReplyGenerator for EchoGenerator {
    async fn generate(
        &self,
        _text: &str,
        history: &[ConversationTurn],
    ) -> Result<String, PipelineError> {
        self.seen_context.lock().push(history.len());
        Ok(self.reply.clone())
    }
}

struct FailingGenerator;

#[async_trait]
impl ReplyGenerator for FailingGenerator {
    async fn generate(
        &self,
        _text: &str,
        _history: &[ConversationTurn],
    ) -> Result<String, PipelineError> {
        Err(PipelineError::Generation("model offline".to_string()))
    }
}

/// Counts submissions; either succeeds with a canned buffer or times out.
struct CountingSynthesizer {
    calls: AtomicUsize,
    time_out: bool,
}

impl CountingSynthesizer {
    fn ok() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            time_out: false,
        }
    }

    fn timing_out() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            time_out: true,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for CountingSynthesizer {
    async fn request_speech(
        &self,
        _text: &str,
        timeout: Duration,
    ) -> Result<Bytes, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.time_out {
            Err(SynthesisError::Timeout(timeout.as_millis() as u64))
        } else {
            Ok(Bytes::from_static(b"fake-wav-audio"))
        }
    }
}

/// Records every buffer handed to playback.
#[derive(Default)]
struct RecordingSink {
    played: Mutex<Vec<Bytes>>,
}

#[async_trait]
impl AudioSink for RecordingSink {
    async fn play(&self, audio: Bytes) -> Result<(), PipelineError> {
        self.played.lock().push(audio);
        Ok(())
    }
}

fn timeouts() -> TimeoutSettings {
    TimeoutSettings {
        recognition_secs: 2,
        generation_secs: 2,
        synthesis_secs: 2,
    }
}

fn utterance() -> Utterance {
    Utterance::new(vec![0.3; 16000], 16000)
}

#[tokio::test]
async fn test_full_exchange_updates_history_and_plays_audio() {
    let generator = Arc::new(EchoGenerator::new("你好呀"));
    let synthesizer = Arc::new(CountingSynthesizer::ok());
    let sink = Arc::new(RecordingSink::default());

    let mut orchestrator = ConversationOrchestrator::new(
        Arc::new(FixedRecognizer("你好".to_string())),
        generator.clone(),
        synthesizer.clone(),
        sink.clone(),
        DialogueHistory::new(10),
        timeouts(),
    );

    let outcome = orchestrator.handle_utterance(utterance()).await.unwrap();
    match outcome {
        CycleOutcome::Completed {
            user_text,
            agent_text,
        } => {
            assert_eq!(user_text, "你好");
            assert_eq!(agent_text, "你好呀");
        }
        other => panic!("unexpected outcome {other:?}"),
    }

    // History holds exactly the paired exchange, in order
    let turns = orchestrator.history().snapshot();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0].speaker, Speaker::User);
    assert_eq!(turns[0].text, "你好");
    assert_eq!(turns[1].speaker, Speaker::Agent);
    assert_eq!(turns[1].text, "你好呀");

    // Generation saw the pre-exchange (empty) snapshot
    assert_eq!(generator.seen_context.lock().as_slice(), &[0]);

    // Playback received a non-empty buffer
    let played = sink.played.lock();
    assert_eq!(played.len(), 1);
    assert!(!played[0].is_empty());
}

#[tokio::test]
async fn test_empty_transcript_skips_turn_without_generation() {
    let synthesizer = Arc::new(CountingSynthesizer::ok());
    let sink = Arc::new(RecordingSink::default());

    let mut orchestrator = ConversationOrchestrator::new(
        Arc::new(FixedRecognizer("   ".to_string())),
        Arc::new(FailingGenerator), // would error if ever invoked
        synthesizer.clone(),
        sink.clone(),
        DialogueHistory::new(10),
        timeouts(),
    );

    let outcome = orchestrator.handle_utterance(utterance()).await.unwrap();
    assert!(matches!(outcome, CycleOutcome::SkippedEmptyTranscript));
    assert!(orchestrator.history().is_empty());
    assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_generation_failure_leaves_history_unchanged() {
    let synthesizer = Arc::new(CountingSynthesizer::ok());
    let sink = Arc::new(RecordingSink::default());

    let mut orchestrator = ConversationOrchestrator::new(
        Arc::new(FixedRecognizer("hello".to_string())),
        Arc::new(FailingGenerator),
        synthesizer.clone(),
        sink.clone(),
        DialogueHistory::new(10),
        timeouts(),
    );

    let result = orchestrator.handle_utterance(utterance()).await;
    assert!(matches!(result, Err(PipelineError::Generation(_))));

    // Turn dropped cleanly: no history entry, no synthesis job, no playback
    assert!(orchestrator.history().is_empty());
    assert_eq!(synthesizer.calls.load(Ordering::SeqCst), 0);
    assert!(sink.played.lock().is_empty());
}

#[tokio::test]
async fn test_synthesis_timeout_skips_playback() {
    let synthesizer = Arc::new(CountingSynthesizer::timing_out());
    let sink = Arc::new(RecordingSink::default());

    let mut orchestrator = ConversationOrchestrator::new(
        Arc::new(FixedRecognizer("hello".to_string())),
        Arc::new(EchoGenerator::new("hi there")),
        synthesizer.clone(),
        sink.clone(),
        DialogueHistory::new(10),
        timeouts(),
    );

    let result = orchestrator.handle_utterance(utterance()).await;
    let err = result.unwrap_err();
    assert!(matches!(err, PipelineError::SynthesisTimeout(_)));
    assert!(err.is_recoverable());

    // No partial or garbled audio is ever played
    assert!(sink.played.lock().is_empty());
}

#[tokio::test]
async fn test_consecutive_cycles_accumulate_bounded_history() {
    let generator = Arc::new(EchoGenerator::new("reply"));
    let mut orchestrator = ConversationOrchestrator::new(
        Arc::new(FixedRecognizer("question".to_string())),
        generator.clone(),
        Arc::new(CountingSynthesizer::ok()),
        Arc::new(RecordingSink::default()),
        DialogueHistory::new(4),
        timeouts(),
    );

    for _ in 0..5 {
        orchestrator.handle_utterance(utterance()).await.unwrap();
    }

    // Capacity 4 holds the last two exchanges
    assert_eq!(orchestrator.history().len(), 4);
    // Each generation call saw the snapshot taken before its own exchange
    assert_eq!(generator.seen_context.lock().as_slice(), &[0, 2, 4, 4, 4]);
}

#[tokio::test]
async fn test_recognition_timeout_is_recoverable() {
    struct StuckRecognizer;

    #[async_trait]
    impl SpeechRecognizer for StuckRecognizer {
        async fn recognize(&self, _utterance: &Utterance) -> Result<String, PipelineError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(String::new())
        }
    }

    let mut orchestrator = ConversationOrchestrator::new(
        Arc::new(StuckRecognizer),
        Arc::new(EchoGenerator::new("reply")),
        Arc::new(CountingSynthesizer::ok()),
        Arc::new(RecordingSink::default()),
        DialogueHistory::new(10),
        TimeoutSettings {
            recognition_secs: 1,
            generation_secs: 2,
            synthesis_secs: 2,
        },
    );

    let result = orchestrator.handle_utterance(utterance()).await;
    let err = result.unwrap_err();
    assert!(matches!(err, PipelineError::Recognition(_)));
    assert!(err.is_recoverable());
}
