//! Paddock CLI - Main Entry Point
//!
//! Bundles the application, serves a bundle and prints the route table.

use clap::{Parser, Subcommand};

use paddock_cli::commands::{bundle, routes, serve};
use paddock_cli::output;

/// Paddock - single-page app bundler and static server
#[derive(Parser)]
#[command(name = "paddock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the static bundle
    Bundle(bundle::BundleArgs),

    /// Serve a built bundle
    Serve(serve::ServeArgs),

    /// Show the client route table
    Routes,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Bundle(args) => bundle::execute(args, cli.format).await?,
        Commands::Serve(args) => serve::execute(args).await?,
        Commands::Routes => routes::execute(cli.format)?,
        Commands::Version => {
            println!("Paddock v{}", paddock_common::VERSION);
        }
    }

    Ok(())
}
