//! `trustweave proof`: Submit, verify, and check proofs.

use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use trustweave_core::{Address, Hash};
use trustweave_crypto::hash;

use crate::client::{MutationResponse, NodeArgs, NodeClient};

#[derive(Args, Debug)]
pub struct ProofArgs {
    #[command(subcommand)]
    pub action: ProofAction,

    #[command(flatten)]
    pub node: NodeArgs,
}

#[derive(Subcommand, Debug)]
pub enum ProofAction {
    /// Submit the hash of a proof file.
    Submit {
        /// Proof file; only its BLAKE3 hash leaves this machine.
        file: PathBuf,
        /// Public inputs, comma separated.
        #[arg(long, value_delimiter = ',')]
        inputs: Vec<u64>,
    },
    /// Record a verification outcome (requires the verifier role).
    Verify {
        id: Hash,
        node_a: Address,
        node_b: Address,
        /// Mark the proof invalid instead of verified.
        #[arg(long)]
        invalid: bool,
    },
    /// Check that a proof file is well-formed before submitting it.
    Format {
        file: PathBuf,
        #[arg(long, value_delimiter = ',')]
        inputs: Vec<u64>,
    },
    /// Show a submitted proof.
    Get { id: Hash },
}

#[derive(Serialize)]
struct SubmitProofRequest<'a> {
    proof_hash: Hash,
    public_inputs: &'a [u64],
}

#[derive(Serialize)]
struct VerifyProofRequest {
    node_a: Address,
    node_b: Address,
    is_valid: bool,
}

#[derive(Serialize)]
struct ProofFormatRequest<'a> {
    proof: String,
    public_inputs: &'a [u64],
}

#[derive(Deserialize)]
struct ProofFormatResponse {
    valid: bool,
}

#[derive(Deserialize)]
struct ProofResponse {
    id: String,
    proof_hash: String,
    prover: String,
    submitted_at: u64,
    status: String,
}

pub async fn run(args: &ProofArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.node);

    match &args.action {
        ProofAction::Submit { file, inputs } => {
            let bytes = std::fs::read(file)?;
            let body = SubmitProofRequest {
                proof_hash: hash(&bytes),
                public_inputs: inputs,
            };
            let resp: MutationResponse = client.post("proofs", &body).await?;
            println!("Proof submitted!");
            println!("  Proof ID:  {}", resp.proof_id.unwrap_or_default());
            println!("  Hash:      {}", body.proof_hash);
        }
        ProofAction::Verify {
            id,
            node_a,
            node_b,
            invalid,
        } => {
            let body = VerifyProofRequest {
                node_a: *node_a,
                node_b: *node_b,
                is_valid: !invalid,
            };
            let _: MutationResponse = client.post(&format!("proofs/{id}/verify"), &body).await?;
            if *invalid {
                println!("Proof {} invalidated", id);
            } else {
                println!("Proof {} verified for {} <-> {}", id, node_a, node_b);
            }
        }
        ProofAction::Format { file, inputs } => {
            let bytes = std::fs::read(file)?;
            let body = ProofFormatRequest {
                proof: hex::encode(&bytes),
                public_inputs: inputs,
            };
            let resp: ProofFormatResponse = client.post_anonymous("proofs/format", &body).await?;
            println!(
                "Proof format {} ({} bytes)",
                if resp.valid { "ok" } else { "rejected" },
                bytes.len()
            );
        }
        ProofAction::Get { id } => {
            let proof: ProofResponse = client.get(&format!("proofs/{id}")).await?;
            println!("Proof {}:", proof.id);
            println!("  Hash:       {}", proof.proof_hash);
            println!("  Prover:     {}", proof.prover);
            println!("  Submitted:  {}", proof.submitted_at);
            println!("  Status:     {}", proof.status);
        }
    }
    Ok(())
}
