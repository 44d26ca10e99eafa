use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;

use olpaka_core::client::ollama_client::OllamaClient;
use olpaka_core::config::{Config, DEFAULT_HOST};
use olpaka_core::download::model_downloader::ModelDownloader;
use olpaka_core::download::state::DownloadStateCell;
use olpaka_core::progress::formatter::format_size_in_bytes;
use olpaka_core::types::types::PullOutcome;

mod terminal_observer;
use terminal_observer::TerminalProgressObserver;

#[derive(Parser)]
#[command(name = "olpaka", about = "Manage models on a local Ollama server")]
struct Args {
    /// Server address, e.g. `localhost`, `0.0.0.0:11434` or `https://box.lan`
    #[arg(long, env = "OLLAMA_HOST", default_value = DEFAULT_HOST)]
    host: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a model, showing live progress. Ctrl-C cancels.
    Pull { model: String },
    /// List installed models
    List,
    /// Remove an installed model
    Rm { model: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = Config::default().with_host(&args.host);
    log::debug!("using server {}", config.host);

    let client = match OllamaClient::new(config) {
        Ok(client) => client,
        Err(e) => {
            eprintln!("Cannot create HTTP client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match args.command {
        Command::Pull { model } => pull(client, &model).await,
        Command::List => list(&client).await,
        Command::Rm { model } => remove(&client, &model).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn pull(client: OllamaClient, model: &str) -> Result<(), String> {
    let state = DownloadStateCell::new();
    let mut downloader = ModelDownloader::new(client, state.clone());
    downloader.add_observer(Box::new(TerminalProgressObserver::new(model)));

    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let mut state_rx = state.subscribe();
    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            log::info!("download state: {}", *state_rx.borrow_and_update());
        }
    });

    match downloader.pull(model, cancel).await {
        Ok(PullOutcome::Completed) => Ok(()),
        Ok(PullOutcome::Cancelled) => Err(format!("Pull of {} cancelled", model)),
        Err(e) => Err(format!("Pull of {} failed: {}", model, e)),
    }
}

async fn list(client: &OllamaClient) -> Result<(), String> {
    let models = client
        .list_models()
        .await
        .map_err(|e| format!("Cannot list models: {}", e))?;

    if models.is_empty() {
        println!("No models installed");
        return Ok(());
    }

    println!("{:<40} {:>10} {:>8} {:<8}", "NAME", "SIZE", "PARAMS", "QUANT");
    for m in &models {
        let details = m.details.as_ref();
        println!(
            "{:<40} {:>10} {:>8} {:<8}",
            m.name,
            format_size_in_bytes(m.size),
            details.and_then(|d| d.parameter_size.as_deref()).unwrap_or("-"),
            details.and_then(|d| d.quantization_level.as_deref()).unwrap_or("-"),
        );
    }
    Ok(())
}

async fn remove(client: &OllamaClient, model: &str) -> Result<(), String> {
    client
        .delete_model(model)
        .await
        .map_err(|e| format!("Cannot remove {}: {}", model, e))?;
    println!("Removed {}", model);
    Ok(())
}
