use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use quipchat::client::{RelayClient, SpeechSynthesizer, SystemSpeech, Terminal, VoiceInput};
use quipchat::{ApiServerBuilder, ChatService, Config, GeminiClient};

/// Quipchat - chat relay for a hosted generative model
#[derive(Parser)]
#[command(name = "quipchat", version, about)]
struct Cli {
    /// Port to listen on
    #[arg(long)]
    port: Option<u16>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Directory with the web client to serve
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the relay (default)
    Serve,
    /// Chat with a running relay from the terminal
    Chat {
        /// Relay base URL
        #[arg(long, env = "QUIPCHAT_URL", default_value = "http://localhost:3000")]
        url: String,
    },
    /// List the speech voices offered in the voice menu
    Voices,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,quipchat=info",
        1 => "info,quipchat=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

#[allow(clippy::future_not_send)]
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        None | Some(Command::Serve) => serve(cli.port, cli.model, cli.static_dir).await,
        Some(Command::Chat { url }) => chat(url).await,
        Some(Command::Voices) => list_voices().await,
    }
}

async fn serve(
    port: Option<u16>,
    model: Option<String>,
    static_dir: Option<PathBuf>,
) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    // Flags override the environment
    if let Some(port) = port {
        config.api_server.port = port;
    }
    if let Some(model) = model {
        config.model = model;
    }
    if static_dir.is_some() {
        config.api_server.static_dir = static_dir;
    }
    tracing::debug!(?config, "loaded configuration");

    let model = GeminiClient::new(
        config.api_key,
        config.model,
        &config.api_base,
        config.upstream_timeout,
    )?;
    let chat = ChatService::new(Arc::new(model), config.generation);

    tracing::info!(port = config.api_server.port, "starting quipchat relay");

    let server = ApiServerBuilder::new(chat, config.api_server.port)
        .static_dir(config.api_server.static_dir)
        .rate_limit(config.api_server.rate_limit_rpm)
        .build();

    tokio::select! {
        result = server.run() => result?,
        _ = tokio::signal::ctrl_c() => tracing::info!("shutting down"),
    }

    Ok(())
}

#[allow(clippy::future_not_send)]
async fn chat(url: String) -> anyhow::Result<()> {
    tracing::info!(relay = %url, "starting terminal chat");

    let relay = RelayClient::new(url);
    let speech: Arc<dyn SpeechSynthesizer> = Arc::new(SystemSpeech::default());

    Terminal::new(Box::new(relay), speech, voice_input())
        .run()
        .await?;
    Ok(())
}

#[cfg(feature = "microphone")]
fn voice_input() -> Option<Box<dyn VoiceInput>> {
    use quipchat::client::{CpalMicrophone, Recorder};

    Some(Box::new(Recorder::new(CpalMicrophone)))
}

#[cfg(not(feature = "microphone"))]
fn voice_input() -> Option<Box<dyn VoiceInput>> {
    None
}

async fn list_voices() -> anyhow::Result<()> {
    let voices = SystemSpeech::default().voices().await?;
    let menu = quipchat::client::menu_voices(&voices);

    if menu.is_empty() {
        println!("No English voices found.");
    }
    for voice in menu {
        println!("{:<32} {}", quipchat::client::speech::menu_label(voice), voice.lang);
    }
    Ok(())
}
