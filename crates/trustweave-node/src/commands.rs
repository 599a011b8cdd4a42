//! Commands dispatched from the HTTP API to the node event loop.
//!
//! The event loop is the only owner of the [`trustweave_ledger::Ledger`], so
//! every mutation is applied by a single writer in arrival order.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use trustweave_core::{Address, Domain, EventRecord, Hash, LedgerError, Role};
use trustweave_identity::{Edge, Identity};
use trustweave_ledger::LedgerStatus;
use trustweave_proof::{Proof, VerifiedConnection};

/// A command sent from the HTTP API to the node's main event loop.
pub enum NodeCommand {
    /// Apply a state change on behalf of `caller`.
    Mutate {
        caller: Address,
        mutation: Mutation,
        reply: oneshot::Sender<Result<MutationResponse, CommandError>>,
    },
    /// Read ledger state.
    Query {
        query: Query,
        reply: oneshot::Sender<Result<serde_json::Value, CommandError>>,
    },
}

/// Every state-changing ledger operation.
#[derive(Debug, Clone)]
pub enum Mutation {
    Register {
        metadata: String,
    },
    UpdateMetadata {
        metadata: String,
    },
    Deactivate,
    CreateRelationship {
        to: Address,
        weight: u64,
        relationship_hash: Hash,
    },
    UpdateEdgeWeight {
        edge_id: Hash,
        new_weight: u64,
    },
    DeactivateEdge {
        edge_id: Hash,
    },
    InitializeReputation {
        node: Address,
    },
    UpdateReputation {
        node: Address,
        score: u64,
    },
    BatchUpdateReputation {
        nodes: Vec<Address>,
        scores: Vec<u64>,
    },
    ApplyDecay {
        node: Address,
    },
    UpdateDecayParameters {
        rate: u64,
        period: u64,
    },
    SubmitProof {
        proof_hash: Hash,
        public_inputs: Vec<u64>,
    },
    VerifyProof {
        proof_id: Hash,
        node_a: Address,
        node_b: Address,
        is_valid: bool,
    },
    BatchVerifyProofs {
        proof_ids: Vec<Hash>,
        nodes_a: Vec<Address>,
        nodes_b: Vec<Address>,
        valids: Vec<bool>,
    },
    GrantRole {
        domain: Domain,
        role: Role,
        account: Address,
    },
    RevokeRole {
        domain: Domain,
        role: Role,
        account: Address,
    },
}

impl Mutation {
    /// Operation name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register { .. } => "register",
            Self::UpdateMetadata { .. } => "update_metadata",
            Self::Deactivate => "deactivate",
            Self::CreateRelationship { .. } => "create_relationship",
            Self::UpdateEdgeWeight { .. } => "update_edge_weight",
            Self::DeactivateEdge { .. } => "deactivate_edge",
            Self::InitializeReputation { .. } => "initialize_reputation",
            Self::UpdateReputation { .. } => "update_reputation",
            Self::BatchUpdateReputation { .. } => "batch_update_reputation",
            Self::ApplyDecay { .. } => "apply_decay",
            Self::UpdateDecayParameters { .. } => "update_decay_parameters",
            Self::SubmitProof { .. } => "submit_proof",
            Self::VerifyProof { .. } => "verify_proof",
            Self::BatchVerifyProofs { .. } => "batch_verify_proofs",
            Self::GrantRole { .. } => "grant_role",
            Self::RevokeRole { .. } => "revoke_role",
        }
    }
}

/// Which of a node's edges an adjacency lookup returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeDirection {
    /// Every edge touching the node, active or not.
    #[default]
    All,
    /// Active edges the node created.
    Outgoing,
    /// Active edges pointing at the node.
    Incoming,
}

/// Read-only ledger queries.
#[derive(Debug, Clone)]
pub enum Query {
    Status,
    Identity { address: Address },
    Edge { edge_id: Hash },
    NodeEdges {
        address: Address,
        direction: EdgeDirection,
    },
    Reputation { node: Address },
    Proof { proof_id: Hash },
    Connection { node_a: Address, node_b: Address },
    ProofFormat { proof: Vec<u8>, public_inputs: Vec<u64> },
    /// Events after `after`; `limit` is capped by the node's page limit.
    EventsSince { after: u64, limit: Option<usize> },
}

/// Failure of a command inside the event loop.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The mutation was applied in memory but could not be persisted.
    #[error("storage error: {0}")]
    Storage(String),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Response after a successful mutation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MutationResponse {
    /// Sequence number of the last event after the mutation.
    pub last_event_seq: u64,
    /// Number of events the mutation appended.
    pub events: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<Hash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_id: Option<Hash>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u64>,
    /// Whether a role grant or revoke changed membership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changed: Option<bool>,
}

/// Response for a status query.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_secs: u64,
    #[serde(flatten)]
    pub ledger: LedgerStatus,
}

/// Response for an identity lookup.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityResponse {
    #[serde(flatten)]
    pub identity: Identity,
}

/// Response for an adjacency lookup.
#[derive(Debug, Clone, Serialize)]
pub struct NodeEdgesResponse {
    pub address: Address,
    pub direction: EdgeDirection,
    pub edges: Vec<Edge>,
}

/// Response for a reputation lookup. `score` is decayed to the current time.
#[derive(Debug, Clone, Serialize)]
pub struct ReputationResponse {
    pub node: Address,
    pub score: u64,
    pub stored_score: u64,
    pub last_updated: u64,
    pub update_count: u64,
}

/// Response for a proof lookup.
#[derive(Debug, Clone, Serialize)]
pub struct ProofResponse {
    #[serde(flatten)]
    pub proof: Proof,
}

/// Response for a connection lookup.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionResponse {
    pub node_a: Address,
    pub node_b: Address,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection: Option<VerifiedConnection>,
}

/// Response for a proof format check.
#[derive(Debug, Clone, Serialize)]
pub struct ProofFormatResponse {
    pub valid: bool,
}

/// Response for an event replay.
#[derive(Debug, Clone, Serialize)]
pub struct EventsResponse {
    pub last_event_seq: u64,
    pub events: Vec<EventRecord>,
}
