//! `trustweave init`: Write a default node configuration file.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

use trustweave_core::{Address, LedgerConfig};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration.
    #[arg(short, long, default_value = "trustweave.toml")]
    pub output: PathBuf,

    /// Deployer address that receives the initial roles.
    #[arg(long)]
    pub deployer: Address,

    /// API port for the node.
    #[arg(long, default_value_t = 9101)]
    pub api_port: u16,

    /// Data directory for the node.
    #[arg(long, default_value = "./data")]
    pub data_dir: PathBuf,

    /// Overwrite an existing file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Serialize)]
struct NodeConfigFile {
    api: ApiSection,
    storage: StorageSection,
    logging: LoggingSection,
    ledger: LedgerConfig,
    admin: AdminSection,
}

#[derive(Serialize)]
struct ApiSection {
    listen_addr: String,
    port: u16,
}

#[derive(Serialize)]
struct StorageSection {
    data_dir: PathBuf,
}

#[derive(Serialize)]
struct LoggingSection {
    level: String,
    format: String,
}

#[derive(Serialize)]
struct AdminSection {
    deployer: Address,
}

fn render(args: &InitArgs) -> anyhow::Result<String> {
    let file = NodeConfigFile {
        api: ApiSection {
            listen_addr: "127.0.0.1".into(),
            port: args.api_port,
        },
        storage: StorageSection {
            data_dir: args.data_dir.clone(),
        },
        logging: LoggingSection {
            level: "info".into(),
            format: "text".into(),
        },
        ledger: LedgerConfig::default(),
        admin: AdminSection {
            deployer: args.deployer,
        },
    };
    Ok(toml::to_string_pretty(&file)?)
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    if args.output.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.output.display()
        );
    }
    let contents = render(args)?;
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(&args.output, contents)?;

    println!("Configuration written to {}", args.output.display());
    println!("  Deployer:  {}", args.deployer);
    println!("  API port:  {}", args.api_port);
    println!();
    println!("Start the node with: trustweave-node --config {}", args.output.display());
    Ok(())
}
