//! CLI binary for voicecmd.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use voicecmd::credentials::CredentialManager;
use voicecmd::platform::ConsolePlatform;
use voicecmd::{CommandConfig, DispatchOutcome, IntentDispatcher, InteractionController, RecognitionClient};

/// voicecmd: wake-phrase voice command controller.
#[derive(Parser)]
#[command(name = "voicecmd", version, about)]
struct Cli {
    /// Path to TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the credential provider endpoint.
    #[arg(long)]
    token_url: Option<String>,

    /// Override the NLU project identifier.
    #[arg(long)]
    project_id: Option<String>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand)]
enum Command {
    /// Run the interaction loop. Each stdin line is a captured WAV file.
    Run,

    /// Send one recording to the NLU backend and show how it would be handled.
    Recognize {
        /// WAV file (16kHz mono 16-bit linear PCM).
        file: PathBuf,
    },

    /// Print the effective configuration as TOML.
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("voicecmd=info,reqwest=warn,hyper=warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(config).await,
        Command::Recognize { file } => recognize(config, &file).await,
        Command::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<CommandConfig> {
    let mut config = match &cli.config {
        Some(path) => CommandConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => {
            let path = CommandConfig::default_config_path();
            if path.exists() {
                CommandConfig::from_file(&path)?
            } else {
                CommandConfig::default()
            }
        }
    };
    if let Some(url) = &cli.token_url {
        config.credentials.token_url.clone_from(url);
    }
    if let Some(project) = &cli.project_id {
        config.nlu.project_id.clone_from(project);
    }
    Ok(config)
}

async fn run(config: CommandConfig) -> anyhow::Result<()> {
    println!("voicecmd v{}", env!("CARGO_PKG_VERSION"));

    let platform = Arc::new(ConsolePlatform::spawn());
    let controller = InteractionController::new(config, platform);
    let cancel = controller.cancel_token();

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("received Ctrl+C, shutting down...");
            cancel_clone.cancel();
        }
    });

    println!("\nReady! Enter the path of a captured WAV file per line. Press Ctrl+C to stop.\n");

    controller.run().await?;
    Ok(())
}

async fn recognize(config: CommandConfig, file: &Path) -> anyhow::Result<()> {
    config.validate()?;
    let audio = tokio::fs::read(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let credential = CredentialManager::new(&config.credentials)?.acquire().await?;
    let client = RecognitionClient::new(&config.nlu, credential)?;
    let result = client.recognize(audio).await?;

    println!("session:    {}", result.session_id);
    println!("intent:     {}", result.intent.as_deref().unwrap_or("<none>"));
    println!("query text: {}", result.query_text.as_deref().unwrap_or(""));
    if !result.parameters.is_empty() {
        println!("parameters: {}", serde_json::Value::Object(result.parameters.clone()));
    }

    match IntentDispatcher::new(&config.cues).route(&result) {
        DispatchOutcome::Success(action) => println!("route:      {action}"),
        DispatchOutcome::Unrecognized(reason) => println!("route:      fallback ({reason})"),
    }
    Ok(())
}
