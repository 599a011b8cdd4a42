//! TrustWeave Identity Layer
//!
//! - Identity registry: single-use registration, metadata updates, and
//!   tombstone deactivation
//! - Graph store: weighted directed edges with deterministic ids and a
//!   per-node adjacency index

pub mod graph;
pub mod registry;

pub use graph::{Edge, GraphStore};
pub use registry::{Identity, IdentityRegistry};
