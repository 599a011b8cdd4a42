pub mod hashing;
pub mod ids;

pub use hashing::{hash, hash_text};
pub use ids::{derive_edge_id, derive_proof_id, CanonicalEncoder};
