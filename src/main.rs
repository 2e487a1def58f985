use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use colloquy::{
    AppState, CaptureBackendFactory, CaptureSource, CapturePipeline, Config,
    ConversationController, CpalOutput, PlaybackScheduler, WebSocketTransport,
};

#[derive(Parser)]
#[command(name = "colloquy", about = "Live conversation audio service")]
struct Cli {
    /// Path to the configuration file (without extension)
    #[arg(short, long, default_value = "config/colloquy")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let cfg = Config::load(&cli.config)?;

    info!("{} v0.1.0", cfg.service.name);

    let session_config = cfg.session_config();

    let transport = Arc::new(WebSocketTransport::new(cfg.live.url.clone()));
    let backend =
        CaptureBackendFactory::create(CaptureSource::Microphone, session_config.capture.clone())?;
    let capture = CapturePipeline::new(backend, session_config.capture.clone());
    let output = CpalOutput::new(session_config.playback_sample_rate);
    let scheduler = PlaybackScheduler::new(Box::new(output), session_config.playback_sample_rate);

    let controller = Arc::new(ConversationController::new(
        session_config,
        transport,
        capture,
        scheduler,
    ));

    if !controller.is_supported() {
        info!("No microphone detected; conversations will fail to start");
    }

    let state = AppState::new(controller);
    let router = colloquy::create_router(state);

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    info!("HTTP control API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
