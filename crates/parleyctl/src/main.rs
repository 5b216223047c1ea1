//! Parley CLI - talk to a running parleyd.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use parley_common::{ErrorResponse, HealthResponse, ProcessRequest, ProcessResponse};

#[derive(Parser)]
#[command(name = "parleyctl", version, about = "Client for the parley intent service")]
struct Cli {
    /// Base URL of the daemon
    #[arg(long, global = true, env = "PARLEY_URL", default_value = "http://127.0.0.1:8000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify an utterance and store the interaction
    Process {
        /// Text to send (words are joined with spaces)
        #[arg(required = true)]
        text: Vec<String>,
    },
    /// Show daemon health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    match cli.command {
        Command::Process { text } => process(&client, &base, text.join(" ")).await,
        Command::Health => health(&client, &base).await,
    }
}

async fn process(client: &reqwest::Client, base: &str, text: String) -> Result<()> {
    let response = client
        .post(format!("{}/process", base))
        .json(&ProcessRequest { text })
        .send()
        .await
        .with_context(|| format!("Failed to reach parleyd at {}", base))?;

    let status = response.status();
    if !status.is_success() {
        let detail = response
            .json::<ErrorResponse>()
            .await
            .map(|e| e.detail)
            .unwrap_or_else(|_| "no detail".to_string());
        bail!("parleyd returned {}: {}", status, detail);
    }

    let body: ProcessResponse = response.json().await.context("Invalid response body")?;
    println!("intent: {}", body.intent);
    if let Some(reply) = body.ai_response {
        println!("{}", reply);
    }
    Ok(())
}

async fn health(client: &reqwest::Client, base: &str) -> Result<()> {
    let health: HealthResponse = client
        .get(format!("{}/health", base))
        .send()
        .await
        .with_context(|| format!("Failed to reach parleyd at {}", base))?
        .error_for_status()?
        .json()
        .await
        .context("Invalid health response")?;

    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}
