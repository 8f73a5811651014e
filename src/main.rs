//! polyglot-tts: OpenAI-compatible TTS server with per-culture voice routing.

mod api;
mod backend;
mod classify;
mod config;
mod dispatch;
mod encode;
mod error;
mod segment;
#[cfg(test)]
mod testing;
mod voice;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "polyglot-tts", about = "OpenAI-compatible text-to-speech server")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("polyglot-tts starting");

    let config = config::Config::load(args.config.as_deref());
    let port = args.port.unwrap_or(config.server.port);

    info!(
        "Audio contract: {} Hz, {} channel(s); {} voice(s) declared",
        config.audio.sample_rate,
        config.audio.channels,
        config.backend.voices.len()
    );

    let state = api::AppState {
        backend: Arc::new(backend::CommandBackend::new(config.backend.clone())),
        converters: Arc::new(encode::ConverterRegistry::with_defaults()),
        audio: config.audio,
    };

    let app = api::router(state);
    let addr = format!("{}:{port}", config.server.host);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
