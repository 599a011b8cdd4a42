//! `trustweave reputation`: Read and manage reputation scores.

use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};

use trustweave_core::Address;

use crate::client::{MutationResponse, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct ReputationArgs {
    #[command(subcommand)]
    pub action: ReputationAction,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Subcommand, Debug)]
pub enum ReputationAction {
    /// Show the current (decayed) score of a node.
    Get { address: Address },
    /// Start tracking a registered node at the initial score.
    Init { address: Address },
    /// Set an absolute score (requires the oracle role).
    Set { address: Address, score: u64 },
    /// Persist accumulated decay for a node.
    Decay { address: Address },
    /// Change the decay rate and period (requires the admin role).
    Params { rate: u64, period: u64 },
}

#[derive(Deserialize)]
struct ReputationResponse {
    node: String,
    score: u64,
    stored_score: u64,
    last_updated: u64,
    update_count: u64,
}

#[derive(Serialize)]
struct ScoreRequest {
    score: u64,
}

#[derive(Serialize)]
struct DecayParametersRequest {
    rate: u64,
    period: u64,
}

pub async fn run(args: &ReputationArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);

    match &args.action {
        ReputationAction::Get { address } => {
            let rep: ReputationResponse = client.get(&format!("reputation/{address}")).await?;
            println!("Reputation of {}:", rep.node);
            println!("  Score:         {}", rep.score);
            println!("  Stored score:  {}", rep.stored_score);
            println!("  Last updated:  {}", rep.last_updated);
            println!("  Updates:       {}", rep.update_count);
        }
        ReputationAction::Init { address } => {
            let resp: MutationResponse = client
                .post(&format!("reputation/{address}/initialize"), &serde_json::json!({}))
                .await?;
            println!("Reputation initialized for {}", address);
            println!("  Score:  {}", resp.score.unwrap_or_default());
        }
        ReputationAction::Set { address, score } => {
            let resp: MutationResponse = client
                .put(&format!("reputation/{address}"), &ScoreRequest { score: *score })
                .await?;
            println!("Reputation updated for {}", address);
            println!("  Score:  {}", resp.score.unwrap_or(*score));
        }
        ReputationAction::Decay { address } => {
            let resp: MutationResponse = client
                .post(&format!("reputation/{address}/decay"), &serde_json::json!({}))
                .await?;
            println!("Decay applied to {}", address);
            println!("  Score:   {}", resp.score.unwrap_or_default());
            if resp.events == 0 {
                println!("  (no full decay period had elapsed)");
            }
        }
        ReputationAction::Params { rate, period } => {
            let _: MutationResponse = client
                .put(
                    "reputation/decay-parameters",
                    &DecayParametersRequest {
                        rate: *rate,
                        period: *period,
                    },
                )
                .await?;
            println!("Decay parameters updated: rate {} every {}s", rate, period);
        }
    }
    Ok(())
}
