//! `trustweave relate`: Open a weighted relationship to another address.

use clap::Args;
use serde::Serialize;

use trustweave_core::{Address, Hash};
use trustweave_crypto::hash_text;

use crate::client::{MutationResponse, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct RelateArgs {
    /// Counterparty address.
    #[arg(long)]
    pub to: Address,

    /// Relationship weight (positive).
    #[arg(short, long, default_value_t = 1)]
    pub weight: u64,

    /// Relationship description; only its BLAKE3 hash is sent.
    #[arg(short, long, conflicts_with = "hash")]
    pub label: Option<String>,

    /// Precomputed relationship hash.
    #[arg(long)]
    pub hash: Option<Hash>,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Serialize)]
struct RelationshipRequest {
    to: Address,
    weight: u64,
    relationship_hash: Hash,
}

fn relationship_hash(args: &RelateArgs) -> anyhow::Result<Hash> {
    match (&args.label, args.hash) {
        (Some(label), None) => Ok(hash_text(label)),
        (None, Some(hash)) => Ok(hash),
        _ => anyhow::bail!("give exactly one of --label or --hash"),
    }
}

pub async fn run(args: &RelateArgs) -> anyhow::Result<()> {
    if args.weight == 0 {
        anyhow::bail!("weight must be positive");
    }
    let body = RelationshipRequest {
        to: args.to,
        weight: args.weight,
        relationship_hash: relationship_hash(args)?,
    };

    let client = NodeClient::new(&args.node);
    let resp: MutationResponse = client.post("relationships", &body).await?;

    println!("Relationship created!");
    println!("  Edge:    {}", resp.edge_id.unwrap_or_default());
    println!("  To:      {}", args.to);
    println!("  Weight:  {}", args.weight);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(label: Option<&str>, hash: Option<Hash>) -> RelateArgs {
        RelateArgs {
            to: Address::repeat_byte(0xb0),
            weight: 1,
            label: label.map(String::from),
            hash,
            node: NodeArgs {
                endpoint: "http://127.0.0.1:9101".into(),
                caller: None,
            },
        }
    }

    #[test]
    fn test_label_is_hashed() {
        let hash = relationship_hash(&args(Some("colleague"), None)).unwrap();
        assert_eq!(hash, hash_text("colleague"));
    }

    #[test]
    fn test_requires_label_or_hash() {
        assert!(relationship_hash(&args(None, None)).is_err());
        let h = Hash::new([3; 32]);
        assert_eq!(relationship_hash(&args(None, Some(h))).unwrap(), h);
    }
}
