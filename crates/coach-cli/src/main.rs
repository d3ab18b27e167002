//! Live coach CLI entry point.

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use coach_cli::cli::Cli;
use coach_cli::commands;

#[tokio::main]
async fn main() {
    // Load .env.local if it exists (for OPENROUTER_API_KEY etc.)
    let _ = dotenvy::from_filename(".env.local");

    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_level().to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = commands::execute(cli.command).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
