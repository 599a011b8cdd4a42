//! TrustWeave Proof: bookkeeping for externally generated relationship
//! proofs.
//!
//! Provides:
//! - Proof lifecycle (pending, then exactly one terminal resolution)
//! - Verifier attestation into order-independent verified connections
//! - Format sanity check for raw proof blobs
//!
//! Proof soundness is the external prover's responsibility; nothing here
//! checks the underlying relationship path.

pub mod format;
pub mod registry;
pub mod status;

pub use format::verify_proof_format;
pub use registry::{PairKey, Proof, ProofRegistry, VerifiedConnection};
pub use status::{ProofStatus, ProofTransition};
