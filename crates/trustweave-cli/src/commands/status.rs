//! `trustweave status`: Query the status of a running node.

use clap::Args;
use serde::Deserialize;

use crate::client::{NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    node_count: u64,
    edge_count: u64,
    reputation_records: u64,
    total_proofs: u64,
    total_verified_proofs: u64,
    decay_rate: u64,
    decay_period: u64,
    last_event_seq: u64,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let status: StatusResponse = client.get("status").await?;

    println!("Node Status:");
    println!("  Version:      {}", status.version);
    println!("  Uptime:       {}s", status.uptime_secs);
    println!("  Identities:   {}", status.node_count);
    println!("  Edges:        {}", status.edge_count);
    println!("  Reputations:  {}", status.reputation_records);
    println!(
        "  Proofs:       {} ({} verified)",
        status.total_proofs, status.total_verified_proofs
    );
    println!(
        "  Decay:        {} / 1000000 every {}s",
        status.decay_rate, status.decay_period
    );
    println!("  Last event:   #{}", status.last_event_seq);
    Ok(())
}
