//! TrustWeave Node: entry point.
//!
//! Starts the ledger node with configuration from a TOML file or defaults.

// Public APIs for node internals: used by tests and external consumers.
#![allow(dead_code)]

mod api;
mod commands;
mod config;
mod node;
mod state;
mod storage;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use trustweave_core::{Address, SystemClock};

use config::TrustweaveConfig;
use node::TrustweaveNode;

/// TrustWeave Node
#[derive(Parser, Debug)]
#[command(name = "trustweave-node", version, about = "TrustWeave ledger node")]
struct Args {
    /// Path to the configuration file (TOML).
    #[arg(short, long, default_value = "trustweave.toml")]
    config: PathBuf,

    /// Override the API port.
    #[arg(long)]
    api_port: Option<u16>,

    /// Override the data directory.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Deployer address for a fresh ledger (overrides admin.deployer).
    #[arg(long)]
    deployer: Option<Address>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(long)]
    log_level: Option<String>,

    /// Generate a default config file and exit.
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Handle --init flag
    if args.init {
        let mut config = TrustweaveConfig::default();
        config.admin.deployer = args.deployer;
        config.save(&args.config)?;
        println!("wrote default config to {}", args.config.display());
        return Ok(());
    }

    // Load configuration
    let mut config = TrustweaveConfig::load(&args.config)?;

    // Apply CLI overrides
    if let Some(api_port) = args.api_port {
        config.api.port = api_port;
    }
    if let Some(ref data_dir) = args.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    if let Some(deployer) = args.deployer {
        config.admin.deployer = Some(deployer);
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    if config.logging.format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    tracing::info!("TrustWeave Node v{}", env!("CARGO_PKG_VERSION"));

    // Open the ledger and start the API
    let mut node = TrustweaveNode::open(config, Arc::new(SystemClock))?;
    let api_addr = node.start().await?;
    tracing::info!(%api_addr, "node ready");

    // Set up graceful shutdown on SIGINT
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
        tracing::info!("received shutdown signal");
    };

    tokio::select! {
        result = node.run() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "node event loop error");
            }
        }
        _ = shutdown => {
            tracing::info!("initiating graceful shutdown");
        }
    }

    node.shutdown().await?;
    tracing::info!("TrustWeave node exited cleanly");
    Ok(())
}
