// crates/driftlock-cli/src/main.rs
//
// CLI entrypoint for the Driftlock tools.
//
// Provides subcommands for recording a lockfile snapshot of a generated
// artifact directory, detecting drift against it, and inspecting or
// applying stored drift:// patches.

mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::detect::DetectArgs;
use commands::lock::LockArgs;
use commands::patch::PatchCmd;

/// Driftlock CLI — drift detection for generated artifacts.
#[derive(Parser, Debug)]
#[command(
    name = "driftlock",
    version = "0.1.0",
    about = "Detect drift in generated artifacts against a lockfile snapshot"
)]
struct Cli {
    /// Path to a TOML detection configuration file.
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Detect drift against the recorded lockfile snapshot.
    Detect(DetectArgs),

    /// Record a lockfile snapshot (and baseline content) of a directory.
    Lock(LockArgs),

    /// Inspect, apply, and maintain stored drift:// patches.
    #[command(subcommand)]
    Patch(PatchCmd),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Detect(args) => commands::detect::run(cli.config.as_deref(), args).await?,
        Commands::Lock(args) => commands::lock::run(args)?,
        Commands::Patch(cmd) => commands::patch::run(cmd)?,
    }

    Ok(())
}
