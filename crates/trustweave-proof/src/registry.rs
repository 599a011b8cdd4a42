use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use trustweave_core::{
    AccessControl, Address, Hash, LedgerConfig, LedgerError, LedgerEvent, Role, Timestamp,
};
use trustweave_crypto::derive_proof_id;

use crate::format::verify_proof_format;
use crate::status::{ProofStatus, ProofTransition};

/// A submitted proof and its resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub id: Hash,
    pub proof_hash: Hash,
    pub prover: Address,
    pub submitted_at: Timestamp,
    pub status: ProofStatus,
}

impl Proof {
    pub fn verified(&self) -> bool {
        self.status == ProofStatus::Verified
    }
}

/// Attestation that `proof_id` was judged valid for the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedConnection {
    pub node_a: Address,
    pub node_b: Address,
    pub proof_id: Hash,
    pub verified_at: Timestamp,
}

/// Order-independent key for a pair of addresses.
///
/// Serialized as `"<lower>:<higher>"` so it can key a JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey(Address, Address);

impl PairKey {
    pub fn new(a: Address, b: Address) -> Self {
        if a <= b {
            Self(a, b)
        } else {
            Self(b, a)
        }
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.0, self.1)
    }
}

impl FromStr for PairKey {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s
            .split_once(':')
            .ok_or_else(|| LedgerError::InvalidEncoding(format!("pair key {s}")))?;
        Ok(Self::new(a.parse()?, b.parse()?))
    }
}

impl Serialize for PairKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PairKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Proof table, verified-connection index, and counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofRegistry {
    access: AccessControl,
    proofs: HashMap<Hash, Proof>,
    connections: HashMap<PairKey, VerifiedConnection>,
    total_proofs: u64,
    total_verified: u64,
    nonce: u64,
    min_proof_len: usize,
}

impl ProofRegistry {
    /// Create an empty registry. The deployer holds every role.
    pub fn new(deployer: Address, config: &LedgerConfig) -> Self {
        Self {
            access: AccessControl::new(deployer, &[Role::Oracle, Role::Updater, Role::Verifier]),
            proofs: HashMap::new(),
            connections: HashMap::new(),
            total_proofs: 0,
            total_verified: 0,
            nonce: 0,
            min_proof_len: config.min_proof_len,
        }
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    /// Record a proof produced by an external prover. Open to any caller.
    ///
    /// `public_inputs` only matter to the external prover and are not kept.
    pub fn submit_proof(
        &mut self,
        caller: Address,
        proof_hash: Hash,
        public_inputs: &[u64],
        now: Timestamp,
    ) -> Result<(Hash, LedgerEvent), LedgerError> {
        let id = derive_proof_id(&proof_hash, &caller, now, self.nonce);
        self.nonce += 1;

        self.proofs.insert(
            id,
            Proof {
                id,
                proof_hash,
                prover: caller,
                submitted_at: now,
                status: ProofStatus::Pending,
            },
        );
        self.total_proofs += 1;
        tracing::info!(
            proof = %id.short(),
            prover = %caller,
            inputs = public_inputs.len(),
            "proof submitted"
        );

        Ok((
            id,
            LedgerEvent::ProofSubmitted {
                proof_id: id,
                prover: caller,
                timestamp: now,
            },
        ))
    }

    /// Resolve a pending proof. Requires the verifier role.
    pub fn verify_proof(
        &mut self,
        caller: Address,
        proof_id: Hash,
        node_a: Address,
        node_b: Address,
        is_valid: bool,
        now: Timestamp,
    ) -> Result<LedgerEvent, LedgerError> {
        self.access.require(Role::Verifier, &caller)?;
        let decision = self.check_decision(&proof_id, is_valid)?;
        Ok(self.resolve(proof_id, decision, node_a, node_b, now))
    }

    /// Resolve several proofs at once. Requires the verifier role.
    ///
    /// All items are checked first: unequal lengths, an unknown or resolved
    /// proof, or the same id twice in one batch rejects the whole batch.
    pub fn batch_verify_proofs(
        &mut self,
        caller: Address,
        proof_ids: &[Hash],
        nodes_a: &[Address],
        nodes_b: &[Address],
        valids: &[bool],
        now: Timestamp,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.access.require(Role::Verifier, &caller)?;
        let len = proof_ids.len();
        if nodes_a.len() != len || nodes_b.len() != len || valids.len() != len {
            return Err(LedgerError::ArrayLengthMismatch(format!(
                "{} ids, {} node_a, {} node_b, {} validity flags",
                len,
                nodes_a.len(),
                nodes_b.len(),
                valids.len()
            )));
        }

        let mut seen = HashSet::with_capacity(len);
        let mut plan = Vec::with_capacity(len);
        for (id, valid) in proof_ids.iter().zip(valids) {
            if !seen.insert(*id) {
                return Err(LedgerError::AlreadyVerified(*id));
            }
            plan.push(self.check_decision(id, *valid)?);
        }

        let events: Vec<LedgerEvent> = plan
            .into_iter()
            .enumerate()
            .map(|(i, decision)| self.resolve(proof_ids[i], decision, nodes_a[i], nodes_b[i], now))
            .collect();
        tracing::info!(count = events.len(), "proof batch resolved");
        Ok(events)
    }

    /// Whether a verified connection exists between `a` and `b`, in either
    /// order.
    pub fn is_connection_verified(&self, a: &Address, b: &Address) -> bool {
        self.connections.contains_key(&PairKey::new(*a, *b))
    }

    /// The latest verified connection between `a` and `b`, in either order.
    pub fn connection(&self, a: &Address, b: &Address) -> Option<&VerifiedConnection> {
        self.connections.get(&PairKey::new(*a, *b))
    }

    /// Length check on a raw proof blob, using the configured minimum.
    pub fn verify_proof_format(
        &self,
        proof: &[u8],
        public_inputs: &[u64],
    ) -> Result<bool, LedgerError> {
        verify_proof_format(proof, public_inputs, self.min_proof_len)
    }

    pub fn get_proof(&self, proof_id: &Hash) -> Result<&Proof, LedgerError> {
        self.proofs
            .get(proof_id)
            .ok_or_else(|| LedgerError::NotFound(format!("proof {proof_id}")))
    }

    /// `false` for unknown, pending and invalidated proofs.
    pub fn is_proof_verified(&self, proof_id: &Hash) -> bool {
        self.proofs
            .get(proof_id)
            .map(Proof::verified)
            .unwrap_or(false)
    }

    pub fn total_proofs(&self) -> u64 {
        self.total_proofs
    }

    pub fn total_verified_proofs(&self) -> u64 {
        self.total_verified
    }

    /// The verifier decision for `proof_id`, once it is known to be legal
    /// from the proof's current status.
    fn check_decision(
        &self,
        proof_id: &Hash,
        is_valid: bool,
    ) -> Result<ProofTransition, LedgerError> {
        let decision = ProofTransition::from_validity(is_valid);
        self.get_proof(proof_id)?.status.transition(proof_id, decision)?;
        Ok(decision)
    }

    // The decision has already been validated by `check_decision`.
    fn resolve(
        &mut self,
        proof_id: Hash,
        decision: ProofTransition,
        node_a: Address,
        node_b: Address,
        now: Timestamp,
    ) -> LedgerEvent {
        let (status, event) = match decision {
            ProofTransition::Accept => {
                self.connections.insert(
                    PairKey::new(node_a, node_b),
                    VerifiedConnection {
                        node_a,
                        node_b,
                        proof_id,
                        verified_at: now,
                    },
                );
                self.total_verified += 1;
                tracing::info!(proof = %proof_id.short(), %node_a, %node_b, "proof verified");
                let event = LedgerEvent::ProofVerified {
                    proof_id,
                    node_a,
                    node_b,
                };
                (ProofStatus::Verified, event)
            }
            ProofTransition::Reject => {
                tracing::info!(proof = %proof_id.short(), "proof invalidated");
                (ProofStatus::Invalidated, LedgerEvent::ProofInvalidated { proof_id })
            }
        };

        if let Some(proof) = self.proofs.get_mut(&proof_id) {
            proof.status = status;
        }
        event
    }
}
