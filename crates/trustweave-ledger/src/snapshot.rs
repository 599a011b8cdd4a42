use serde::{Deserialize, Serialize};

use trustweave_core::{LedgerConfig, LedgerError};
use trustweave_identity::{GraphStore, IdentityRegistry};
use trustweave_proof::ProofRegistry;
use trustweave_reputation::ReputationLedger;

/// Complete persisted state of a [`crate::Ledger`], minus the event
/// history, which is stored record by record.
///
/// Carries id-derivation nonces and role sets, so a restored ledger keeps
/// producing fresh ids and enforcing the same permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub config: LedgerConfig,
    pub identities: IdentityRegistry,
    pub graph: GraphStore,
    pub reputation: ReputationLedger,
    pub proofs: ProofRegistry,
    pub last_event_seq: u64,
}

impl LedgerSnapshot {
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, LedgerError> {
        serde_json::to_vec(self)
            .map_err(|e| LedgerError::InvalidEncoding(format!("snapshot: {e}")))
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, LedgerError> {
        serde_json::from_slice(bytes)
            .map_err(|e| LedgerError::InvalidEncoding(format!("snapshot: {e}")))
    }
}

/// Counters and parameters reported by the node's status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatus {
    pub node_count: u64,
    pub edge_count: u64,
    pub reputation_records: u64,
    pub total_proofs: u64,
    pub total_verified_proofs: u64,
    pub decay_rate: u64,
    pub decay_period: u64,
    pub last_event_seq: u64,
}
