//! `trustweave register`: Register the caller's identity.

use clap::Args;
use serde::Serialize;

use crate::client::{MutationResponse, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Opaque metadata reference (e.g. an IPFS URI).
    #[arg(short, long, default_value = "")]
    pub metadata: String,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Serialize)]
struct RegisterRequest<'a> {
    metadata: &'a str,
}

pub async fn run(args: &RegisterArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);
    let resp: MutationResponse = client
        .post(
            "identities",
            &RegisterRequest {
                metadata: &args.metadata,
            },
        )
        .await?;

    println!("Identity registered!");
    if let Some(caller) = args.node.caller {
        println!("  Address:  {}", caller);
    }
    println!("  Event:    #{}", resp.last_event_seq);
    Ok(())
}
