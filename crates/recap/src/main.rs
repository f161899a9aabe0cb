use anyhow::Context;
use clap::{Parser, Subcommand};
use recap_engine::{ConfigLoader, Pipeline, RecapConfig, SessionId, replay};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::io::AsyncReadExt;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "recap", version, about = "Replay captured browser records through the redaction pipeline")]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Config file (defaults to ./recap.yaml, then ~/.recap/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Mode {
    /// Ingest newline-delimited envelopes and print the sanitized sessions
    Replay {
        /// Capture file (reads stdin when omitted)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Only print this session
        #[arg(long)]
        session: Option<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only the exported records.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref()).await?;

    match args.mode {
        Mode::Replay { file, session } => {
            let content = read_input(file.as_deref()).await?;
            let pipeline = Pipeline::from_config(&config).context("Invalid redaction config")?;
            let summary = replay(&pipeline, &content);
            info!(
                ingested = summary.ingested,
                dropped = summary.dropped,
                malformed = summary.malformed,
                "Replay finished"
            );

            let lifecycle = pipeline.lifecycle();
            let sessions = match session {
                Some(id) => vec![SessionId::from(id)],
                None => lifecycle.sessions(),
            };
            let mut output = Map::new();
            for id in sessions {
                output.insert(id.to_string(), lifecycle.export(&id));
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(output))?);
        }
        Mode::Config => {
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}

async fn load_config(path: Option<&Path>) -> anyhow::Result<RecapConfig> {
    let config = match path {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    Ok(config)
}

async fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut content = String::new();
            tokio::io::stdin().read_to_string(&mut content).await?;
            Ok(content)
        }
    }
}
