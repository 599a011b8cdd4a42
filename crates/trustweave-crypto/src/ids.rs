//! Deterministic identifier derivation.
//!
//! Identifiers are BLAKE3 digests over a canonical encoding: a
//! length-prefixed domain tag followed by fixed-width fields (addresses as
//! 20 raw bytes, hashes as 32 raw bytes, integers as 8 big-endian bytes).
//! Every derivation mixes in a per-table nonce, so identical inputs in the
//! same second still yield distinct identifiers.

use trustweave_core::{Address, Hash, Timestamp};

const EDGE_DOMAIN: &str = "trustweave/edge/v1";
const PROOF_DOMAIN: &str = "trustweave/proof/v1";

/// Builds a canonical byte encoding and hashes it.
pub struct CanonicalEncoder {
    hasher: blake3::Hasher,
}

impl CanonicalEncoder {
    /// Start an encoding under a domain tag.
    pub fn new(domain: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&(domain.len() as u64).to_be_bytes());
        hasher.update(domain.as_bytes());
        Self { hasher }
    }

    pub fn address(mut self, address: &Address) -> Self {
        self.hasher.update(address.as_bytes());
        self
    }

    pub fn hash(mut self, hash: &Hash) -> Self {
        self.hasher.update(hash.as_bytes());
        self
    }

    pub fn u64(mut self, value: u64) -> Self {
        self.hasher.update(&value.to_be_bytes());
        self
    }

    pub fn finish(self) -> Hash {
        Hash::new(*self.hasher.finalize().as_bytes())
    }
}

/// Edge id from `(node_a, node_b, weight, created_at, relationship_hash, nonce)`.
pub fn derive_edge_id(
    node_a: &Address,
    node_b: &Address,
    weight: u64,
    created_at: Timestamp,
    relationship_hash: &Hash,
    nonce: u64,
) -> Hash {
    CanonicalEncoder::new(EDGE_DOMAIN)
        .address(node_a)
        .address(node_b)
        .u64(weight)
        .u64(created_at)
        .hash(relationship_hash)
        .u64(nonce)
        .finish()
}

/// Proof id from `(proof_hash, prover, submitted_at, nonce)`.
pub fn derive_proof_id(
    proof_hash: &Hash,
    prover: &Address,
    submitted_at: Timestamp,
    nonce: u64,
) -> Hash {
    CanonicalEncoder::new(PROOF_DOMAIN)
        .hash(proof_hash)
        .address(prover)
        .u64(submitted_at)
        .u64(nonce)
        .finish()
}
