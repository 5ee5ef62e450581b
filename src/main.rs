use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod extraction;
mod ingest;
mod pipeline;
#[cfg(test)]
mod test_support;
mod transcript;

use config::{CliOverrides, Config};
use extraction::ValidationPolicy;
use ingest::DaemonClient;
use pipeline::ExtractOutcome;
use transcript::TranscriptSession;

/// distill - turn coding session transcripts into reusable learnings
#[derive(Parser)]
#[command(name = "distill")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Extract learnings from session transcripts into the memory daemon",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to .distill/config.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract learnings from a transcript with an LLM and store them
    Extract {
        /// Transcript file; its directory name becomes the session id
        transcript: PathBuf,
        /// Memory daemon URL (overrides CLAUDE_DAEMON_URL)
        #[arg(long)]
        daemon_url: Option<String>,
        /// Only accept known learning types and confidence within [0, 1]
        #[arg(long)]
        strict: bool,
        /// Print extracted learnings as JSON instead of storing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Import learnings from a JSONL file
    Import {
        /// One learning JSON object per line
        input: PathBuf,
        /// Memory daemon URL (overrides CLAUDE_DAEMON_URL)
        #[arg(long)]
        daemon_url: Option<String>,
        /// Only accept known learning types and confidence within [0, 1]
        #[arg(long)]
        strict: bool,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr) // stdout is reserved for learnings JSON
        .init();

    match cli.command {
        Commands::Extract { transcript, daemon_url, strict, dry_run } => {
            let config = Config::load(CliOverrides {
                config_path: cli.config,
                daemon_url,
                strict,
            })?;
            extract(&config, &transcript, dry_run).await
        }
        Commands::Import { input, daemon_url, strict } => {
            let config = Config::load(CliOverrides {
                config_path: cli.config,
                daemon_url,
                strict,
            })?;
            let store = DaemonClient::from_config(&config);
            let policy = ValidationPolicy::from_strict(config.strict_validation);

            let report = ingest::import_learnings(&store, &input, policy).await?;
            report.print_summary();
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn extract(config: &Config, path: &std::path::Path, dry_run: bool) -> Result<ExitCode> {
    let session = TranscriptSession::load(path, config.max_transcript_chars)?;
    let providers = extraction::default_providers(config);
    let store = DaemonClient::from_config(config);
    let policy = ValidationPolicy::from_strict(config.strict_validation);

    let outcome = pipeline::run_extraction(&session, &providers, &store, policy, dry_run).await?;

    match outcome {
        ExtractOutcome::NothingExtracted => Ok(ExitCode::SUCCESS),
        ExtractOutcome::DryRun(learnings) => {
            println!("{}", serde_json::to_string_pretty(&learnings)?);
            Ok(ExitCode::SUCCESS)
        }
        ExtractOutcome::Degraded(learnings) => {
            eprintln!("Daemon not reachable at {}; writing learnings to stdout", config.daemon_url);
            println!("{}", serde_json::to_string_pretty(&learnings)?);
            Ok(ExitCode::FAILURE)
        }
        ExtractOutcome::Ingested(report) => {
            info!(
                "{} duplicates, {} failed (session {})",
                report.duplicates, report.failed, session.session_id
            );
            eprintln!();
            eprintln!("{}", report);
            Ok(ExitCode::SUCCESS)
        }
    }
}
