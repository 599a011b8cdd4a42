//! TrustWeave CLI: Command-line client for a TrustWeave ledger node.
//!
//! Subcommands: init, status, register, relate, reputation, proof, events.

mod client;
mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// TrustWeave: Social-trust ledger.
#[derive(Parser, Debug)]
#[command(name = "trustweave", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default node configuration file.
    Init(commands::init::InitArgs),
    /// Query the status of a running node.
    Status(commands::status::StatusArgs),
    /// Register the caller's identity.
    Register(commands::register::RegisterArgs),
    /// Open a weighted relationship from the caller to another address.
    Relate(commands::relate::RelateArgs),
    /// Read and manage reputation scores.
    Reputation(commands::reputation::ReputationArgs),
    /// Submit, verify, and check proofs.
    Proof(commands::proof::ProofArgs),
    /// Replay the ledger event log.
    Events(commands::events::EventsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Register(args) => commands::register::run(args).await,
        Commands::Relate(args) => commands::relate::run(args).await,
        Commands::Reputation(args) => commands::reputation::run(args).await,
        Commands::Proof(args) => commands::proof::run(args).await,
        Commands::Events(args) => commands::events::run(args).await,
    }
}
