mod config;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use runtime::{
    CountryInfo, Message, OllamaBackend, OrchestrationLoop, Role, ToolExecutor, ToolRegistry,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::{Config, CountryConfig};
use error::{Error, Result};

const CONFIG_FILE: &str = "toolrelay.toml";
const DEFAULT_PROMPT: &str = "Look up Germany for me. In particular, what is its capital?";

#[derive(Parser)]
#[command(name = "toolrelay")]
#[command(about = "Let a local model call tools to answer a question", long_about = None)]
#[command(version)]
struct Cli {
    /// Question to ask the model
    prompt: Option<String>,

    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Model to use (overrides the config file)
    #[arg(short, long)]
    model: Option<String>,

    /// Chat endpoint URL (overrides the config file)
    #[arg(long)]
    endpoint: Option<String>,

    /// Show progress logs and the conversation transcript
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        match &e {
            Error::Run(failure) => {
                eprintln!("Error [{}]: {e}", failure.error.kind());
                eprintln!("\nConversation at failure:");
                print_transcript(failure.conversation.snapshot());
            }
            _ => eprintln!("Error: {e}"),
        }
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.backend.model = model;
    }
    if let Some(endpoint) = cli.endpoint {
        config.backend.endpoint = endpoint;
    }

    let backend = OllamaBackend::builder(&config.backend.model)
        .endpoint(&config.backend.endpoint)
        .bypass_proxy(config.backend.bypass_proxy)
        .request_timeout(Duration::from_secs(config.backend.request_timeout_secs))
        .build()?;
    info!(%backend, "backend ready");

    let registry = build_registry(&config.country)?;
    let executor = ToolExecutor::new(Arc::new(registry), config.tools.executor_config());
    let orchestrator = OrchestrationLoop::new(backend, executor);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling run");
            on_interrupt.cancel();
        }
    });

    let prompt = cli.prompt.unwrap_or_else(|| DEFAULT_PROMPT.to_string());
    let completion = orchestrator
        .run_with_cancel(prompt, &cancel)
        .await
        .map_err(Box::new)?;

    if cli.verbose {
        print_transcript(completion.conversation.snapshot());
        eprintln!(
            "[{}] {} tokens in, {} tokens out\n",
            completion.state, completion.usage.input_tokens, completion.usage.output_tokens
        );
    }
    println!("{}", completion.answer);
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

fn build_registry(country: &CountryConfig) -> Result<ToolRegistry> {
    let mut client = reqwest::Client::builder();
    if country.bypass_proxy {
        client = client.no_proxy();
    }
    let client = client
        .build()
        .map_err(|e| Error::ToolSetup(e.to_string()))?;

    let mut registry = ToolRegistry::new();
    registry.register(
        CountryInfo::spec(),
        CountryInfo::new(client, &country.base_url),
    )?;
    Ok(registry)
}

fn print_transcript(messages: &[Message]) {
    for message in messages {
        let role = match message.role {
            Role::User => "USER",
            Role::Assistant => "ASSISTANT",
            Role::Tool => "TOOL",
        };
        match &message.tool_call_id {
            Some(id) => eprintln!("{role} ({id}): {}", truncate(message.text())),
            None if !message.text().is_empty() => eprintln!("{role}: {}", truncate(message.text())),
            None => {}
        }
        for call in &message.tool_calls {
            let arguments = serde_json::Value::Object(call.arguments.clone());
            eprintln!("{role} -> {} ({}) {arguments}", call.name, call.id);
        }
    }
    eprintln!();
}

// Truncate long messages for display
fn truncate(content: &str) -> String {
    const LIMIT: usize = 200;
    match content.char_indices().nth(LIMIT) {
        Some((end, _)) => format!("{}...", &content[..end]),
        None => content.to_string(),
    }
}
