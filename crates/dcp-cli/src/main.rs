// crates/dcp-cli/src/main.rs
//
// CLI entrypoint for the DCP submission tools.
//
// Provides subcommands for building analysis and reference metadata,
// submitting it to the ingest service, confirming an envelope, and reading
// an envelope's upload area.

mod commands;
mod config;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::analysis_metadata::AnalysisMetadataCmd;
use commands::confirm::ConfirmCmd;
use commands::reference_file::ReferenceFileCmd;
use commands::submit::SubmitCmd;
use commands::upload_urn::UploadUrnCmd;
use commands::Context;
use config::{Overrides, ToolsConfig};

/// DCP submission tools.
#[derive(Parser, Debug)]
#[command(
    name = "dcp",
    version = "0.1.0",
    about = "Build analysis metadata for a workflow run and submit it to the ingest service"
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Record every HTTP request/response pair to disk.
    #[arg(long, global = true)]
    record: bool,

    #[arg(long = "record_directory", global = true)]
    record_directory: Option<String>,

    #[arg(long = "retry_timeout_seconds", global = true)]
    retry_timeout_seconds: Option<u64>,

    #[arg(long = "retry_max_attempts", global = true)]
    retry_max_attempts: Option<u32>,

    /// Directory artifacts are written to.
    #[arg(long = "output_dir", global = true)]
    output_dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Build analysis protocol, process, and file documents for a run.
    CreateAnalysisMetadata(AnalysisMetadataCmd),

    /// Describe a local reference file.
    CreateReferenceFile(ReferenceFileCmd),

    /// Create an envelope and submit analysis metadata to it.
    Submit(SubmitCmd),

    /// Wait for an existing envelope to validate, then confirm it.
    Confirm(ConfirmCmd),

    /// Wait for an envelope's upload area and print its URN.
    GetUploadUrn(UploadUrnCmd),
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            record: self.record,
            record_directory: self.record_directory.clone(),
            retry_timeout_seconds: self.retry_timeout_seconds,
            retry_max_attempts: self.retry_max_attempts,
            output_dir: self.output_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (mut config, load_error) = match &cli.config {
        Some(path) => match ToolsConfig::load(path) {
            Ok(config) => (config, None),
            Err(e) => (ToolsConfig::default(), Some(format!("{}: {}", path, e))),
        },
        None => (ToolsConfig::default(), None),
    };
    config.apply(&cli.overrides());

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    if let Some(reason) = load_error {
        tracing::warn!("Failed to load config ({}), using defaults", reason);
    }

    let ctx = match Context::new(config) {
        Ok(ctx) => ctx,
        Err(e) => return fail(e),
    };

    let result = match &cli.command {
        Commands::CreateAnalysisMetadata(cmd) => commands::analysis_metadata::run(&ctx, cmd).await,
        Commands::CreateReferenceFile(cmd) => commands::reference_file::run(&ctx, cmd).await,
        Commands::Submit(cmd) => commands::submit::run(&ctx, cmd).await,
        Commands::Confirm(cmd) => commands::confirm::run(&ctx, cmd).await,
        Commands::GetUploadUrn(cmd) => commands::upload_urn::run(&ctx, cmd).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn fail(error: dcp_core::DcpError) -> ExitCode {
    tracing::error!("{}", error);
    eprintln!("Error: {}", error);
    ExitCode::FAILURE
}
