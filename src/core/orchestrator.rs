//! Conversation orchestration.
//!
//! The orchestrator drives one turn of spoken conversation at a time through
//! a fixed stage sequence:
//!
//! ```text
//! Listening ─► Recognizing ─► Generating ─► SynthesizingAwait ─► Playing ─┐
//!     ▲                                                                   │
//!     └────────────────── (also on any stage error) ──────────────────────┘
//! ```
//!
//! Stages run strictly sequentially per cycle. Capture is gated off from the
//! moment an utterance is emitted until playback completes, so capture and
//! playback never overlap (half-duplex) and the agent cannot trigger itself.
//! Every cross-boundary call carries a timeout; the only unbounded wait is
//! `Listening` itself, which ends on detected speech or a stop signal.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::config::{TimeoutSettings, VadSettings};
use crate::core::asr::SpeechRecognizer;
use crate::core::audio::{AudioCapture, AudioSink, Utterance};
use crate::core::history::DialogueHistory;
use crate::core::llm::ReplyGenerator;
use crate::core::tts_client::SpeechSynthesizer;
use crate::core::vad::{UtteranceDetector, VadConfig, VadOutcome};
use crate::errors::PipelineError;

/// Current stage of the conversation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorState {
    Listening,
    Recognizing,
    Generating,
    SynthesizingAwait,
    Playing,
}

/// How one cycle ended.
#[derive(Debug)]
pub enum CycleOutcome {
    /// Full exchange: recognized, replied, synthesized, played.
    Completed { user_text: String, agent_text: String },
    /// Recognition produced nothing usable; the turn was skipped without
    /// invoking generation.
    SkippedEmptyTranscript,
}

/// The top-level state machine driving capture, recognition, generation,
/// synthesis, and playback in turn order.
///
/// Sole owner and writer of the dialogue history. Collaborators are opaque
/// behind their traits.
pub struct ConversationOrchestrator {
    recognizer: Arc<dyn SpeechRecognizer>,
    generator: Arc<dyn ReplyGenerator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    sink: Arc<dyn AudioSink>,
    history: DialogueHistory,
    timeouts: TimeoutSettings,
    state: OrchestratorState,
    turn_count: u64,
}

impl ConversationOrchestrator {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognizer>,
        generator: Arc<dyn ReplyGenerator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
        sink: Arc<dyn AudioSink>,
        history: DialogueHistory,
        timeouts: TimeoutSettings,
    ) -> Self {
        Self {
            recognizer,
            generator,
            synthesizer,
            sink,
            history,
            timeouts,
            state: OrchestratorState::Listening,
            turn_count: 0,
        }
    }

    /// Run the conversation loop until the stop signal flips.
    ///
    /// Device errors propagate out; every other stage failure drops the
    /// current turn and returns to listening.
    pub async fn run(
        &mut self,
        mut capture: AudioCapture,
        vad: &VadSettings,
        mut stop: watch::Receiver<bool>,
        greeting: Option<&str>,
    ) -> Result<(), PipelineError> {
        if let Some(text) = greeting {
            // Greeting failures are not fatal; the conversation still starts
            if let Err(e) = self.speak(text).await {
                warn!("greeting failed: {e}");
            }
        }

        let mut detector =
            UtteranceDetector::new(VadConfig::from_settings(vad), capture.sample_rate());

        loop {
            self.state = OrchestratorState::Listening;
            capture.resume();
            detector.reset();

            let utterance = tokio::select! {
                utterance = listen(&mut capture, &mut detector) => match utterance {
                    Some(u) => u,
                    None => {
                        return Err(PipelineError::Device(
                            "capture stream ended unexpectedly".to_string(),
                        ));
                    }
                },
                _ = stop.changed() => {
                    info!("stop signal received, shutting down");
                    break;
                }
            };

            // Half-duplex: no capture while thinking or speaking
            capture.pause();

            self.turn_count += 1;
            info!(turn = self.turn_count, "utterance captured, starting cycle");

            match self.handle_utterance(utterance).await {
                Ok(CycleOutcome::Completed {
                    user_text,
                    agent_text,
                }) => {
                    info!(turn = self.turn_count, user = %user_text, agent = %agent_text, "cycle complete");
                }
                Ok(CycleOutcome::SkippedEmptyTranscript) => {
                    info!(turn = self.turn_count, "nothing intelligible, resuming listening");
                }
                Err(e) if e.is_recoverable() => {
                    // Failed cycle ends without a spoken reply
                    warn!(turn = self.turn_count, "cycle failed, resuming listening: {e}");
                }
                Err(e) => {
                    error!("fatal device error: {e}");
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Drive one utterance through recognition, generation, synthesis, and
    /// playback.
    pub async fn handle_utterance(
        &mut self,
        utterance: Utterance,
    ) -> Result<CycleOutcome, PipelineError> {
        // Recognizing
        self.state = OrchestratorState::Recognizing;
        let user_text = self.recognize(&utterance).await?;
        drop(utterance);

        let user_text = user_text.trim().to_string();
        if user_text.is_empty() {
            return Ok(CycleOutcome::SkippedEmptyTranscript);
        }
        debug!(text = %user_text, "transcript");

        // Generating
        self.state = OrchestratorState::Generating;
        let agent_text = self.generate(&user_text).await?;

        // The exchange enters history only once the reply is known, as one
        // state update: no user turn without its paired reply.
        self.history.append_exchange(&user_text, &agent_text);
        debug!(text = %agent_text, "reply");

        // SynthesizingAwait
        self.state = OrchestratorState::SynthesizingAwait;
        let audio = self
            .synthesizer
            .request_speech(&agent_text, self.timeouts.synthesis())
            .await?;

        // Playing
        self.state = OrchestratorState::Playing;
        self.sink.play(audio).await?;

        Ok(CycleOutcome::Completed {
            user_text,
            agent_text,
        })
    }

    async fn recognize(&self, utterance: &Utterance) -> Result<String, PipelineError> {
        tokio::time::timeout(
            self.timeouts.recognition(),
            self.recognizer.recognize(utterance),
        )
        .await
        .map_err(|_| {
            PipelineError::Recognition(format!(
                "no transcript within {}s",
                self.timeouts.recognition_secs
            ))
        })?
    }

    async fn generate(&self, text: &str) -> Result<String, PipelineError> {
        let snapshot = self.history.snapshot();
        let reply = tokio::time::timeout(
            self.timeouts.generation(),
            self.generator.generate(text, &snapshot),
        )
        .await
        .map_err(|_| {
            PipelineError::Generation(format!(
                "no reply within {}s",
                self.timeouts.generation_secs
            ))
        })??;

        let reply = reply.trim().to_string();
        if reply.is_empty() {
            return Err(PipelineError::Generation("generator returned empty reply".to_string()));
        }
        Ok(reply)
    }

    /// Synthesize and play a line outside the normal cycle (greeting).
    async fn speak(&mut self, text: &str) -> Result<(), PipelineError> {
        self.state = OrchestratorState::SynthesizingAwait;
        let audio = self
            .synthesizer
            .request_speech(text, self.timeouts.synthesis())
            .await?;
        self.state = OrchestratorState::Playing;
        self.sink.play(audio).await?;
        self.state = OrchestratorState::Listening;
        Ok(())
    }

    pub fn state(&self) -> OrchestratorState {
        self.state
    }

    pub fn history(&self) -> &DialogueHistory {
        &self.history
    }

    pub fn turn_count(&self) -> u64 {
        self.turn_count
    }
}

/// Feed capture frames through the detector until an utterance emerges.
async fn listen(
    capture: &mut AudioCapture,
    detector: &mut UtteranceDetector,
) -> Option<Utterance> {
    loop {
        let frame = capture.next_frame().await?;
        if let VadOutcome::Utterance(utterance) = detector.observe(&frame) {
            return Some(utterance);
        }
    }
}
