use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::anyhow;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{info, warn};

use voxloop::config::AppConfig;
use voxloop::core::asr::HttpRecognizer;
use voxloop::core::audio::{AudioCapture, AudioPlayback};
use voxloop::core::llm::HttpGenerator;
use voxloop::core::{ConversationOrchestrator, DialogueHistory, SynthesisClient};
use voxloop::service::ToneEngine;
use voxloop::{AppState, routes};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Handle CLI arguments: an optional `serve` command plus `--config`
    let mut serve = false;
    let mut config_path: Option<PathBuf> = None;

    let mut args = env::args();
    let _ = args.next();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "serve" => serve = true,
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
            }
            other => {
                anyhow::bail!("Unknown argument '{other}'. Usage: voxloop [serve] [--config <path>]")
            }
        }
    }

    let config = match &config_path {
        Some(path) => AppConfig::from_file(path).map_err(|e| anyhow!(e.to_string()))?,
        None => AppConfig::from_env().map_err(|e| anyhow!(e.to_string()))?,
    };

    if serve {
        run_service(config).await
    } else {
        run_conversation(config).await
    }
}

/// Run the synthesis job service.
async fn run_service(config: AppConfig) -> anyhow::Result<()> {
    let engine = Box::new(ToneEngine::new(config.audio.sample_rate));
    let address = config.service.address();
    let state = AppState::new(config, engine);

    let app = routes::create_router().with_state(state);
    let listener = TcpListener::bind(&address).await?;
    info!("synthesis service listening on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}

/// Run the conversation orchestrator against the configured collaborators.
async fn run_conversation(config: AppConfig) -> anyhow::Result<()> {
    let synthesizer = Arc::new(SynthesisClient::new(&config.tts_client)?);
    if !synthesizer.health_check().await {
        warn!(
            "synthesis service at {} is not responding; start it with `voxloop serve`",
            config.tts_client.base_url
        );
    }

    let recognizer = Arc::new(HttpRecognizer::new(
        &config.recognizer_url,
        config.timeouts.recognition(),
    )?);
    let generator = Arc::new(HttpGenerator::new(
        &config.generator_url,
        config.timeouts.generation(),
    )?);

    // Device acquisition happens up front so a missing microphone or
    // speaker fails before the conversation starts
    let sink = Arc::new(AudioPlayback::new()?);
    let capture = AudioCapture::start(&config.audio)?;

    let history = DialogueHistory::new(config.max_history_turns);
    let mut orchestrator = ConversationOrchestrator::new(
        recognizer,
        generator,
        synthesizer,
        sink,
        history,
        config.timeouts.clone(),
    );

    // ctrl-c flips the stop signal; the orchestrator drains out of its
    // listening state and releases the devices on return
    let (stop_tx, stop_rx) = watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        let _ = stop_tx.send(true);
    });

    info!("conversation started, speak when ready (ctrl-c to exit)");
    orchestrator
        .run(capture, &config.vad, stop_rx, config.greeting.as_deref())
        .await?;

    info!("conversation ended after {} turns", orchestrator.turn_count());
    Ok(())
}
