use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use trustweave_core::{Address, Hash, LedgerError, LedgerEvent, Timestamp};
use trustweave_crypto::derive_edge_id;

/// A directed weighted relationship between two addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub id: Hash,
    /// Creator of the edge. The only address allowed to mutate it.
    pub node_a: Address,
    pub node_b: Address,
    /// Always positive.
    pub weight: u64,
    pub created_at: Timestamp,
    /// Opaque commitment to the relationship description.
    pub relationship_hash: Hash,
    pub active: bool,
}

/// Append-only edge table with a per-node adjacency index.
///
/// Edges are never removed: deactivation is a permanent tombstone. Each edge
/// id is listed under both of its endpoints, so a lookup by either address
/// finds it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphStore {
    edges: HashMap<Hash, Edge>,
    node_edges: HashMap<Address, Vec<Hash>>,
    edge_count: u64,
    nonce: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an edge from `node_a` to `node_b`.
    ///
    /// The id mixes in a monotonically increasing nonce, so identical inputs
    /// at the same instant still produce distinct edges.
    pub fn create_edge(
        &mut self,
        node_a: Address,
        node_b: Address,
        weight: u64,
        relationship_hash: Hash,
        now: Timestamp,
    ) -> Result<(Hash, LedgerEvent), LedgerError> {
        if node_a.is_zero() || node_b.is_zero() {
            return Err(LedgerError::InvalidAddress("edge endpoint is the zero address".into()));
        }
        if node_a == node_b {
            return Err(LedgerError::SelfRelationship(node_a));
        }
        check_weight(weight)?;

        let id = derive_edge_id(&node_a, &node_b, weight, now, &relationship_hash, self.nonce);
        self.nonce += 1;

        self.edges.insert(
            id,
            Edge {
                id,
                node_a,
                node_b,
                weight,
                created_at: now,
                relationship_hash,
                active: true,
            },
        );
        self.node_edges.entry(node_a).or_default().push(id);
        self.node_edges.entry(node_b).or_default().push(id);
        self.edge_count += 1;

        tracing::info!(edge = %id.short(), from = %node_a, to = %node_b, weight, "edge created");

        Ok((
            id,
            LedgerEvent::EdgeCreated {
                edge_id: id,
                node_a,
                node_b,
                weight,
                timestamp: now,
            },
        ))
    }

    /// Change the weight of an active edge. Only the edge's creator may call.
    pub fn update_weight(
        &mut self,
        caller: Address,
        edge_id: Hash,
        new_weight: u64,
    ) -> Result<LedgerEvent, LedgerError> {
        let edge = self.owned_active_edge(&caller, &edge_id)?;
        check_weight(new_weight)?;

        let old_weight = edge.weight;
        edge.weight = new_weight;
        tracing::info!(edge = %edge_id.short(), old_weight, new_weight, "edge weight updated");

        Ok(LedgerEvent::EdgeUpdated {
            edge_id,
            new_weight,
        })
    }

    /// Permanently deactivate an edge. Only the edge's creator may call.
    pub fn deactivate_edge(
        &mut self,
        caller: Address,
        edge_id: Hash,
    ) -> Result<LedgerEvent, LedgerError> {
        let edge = self.owned_active_edge(&caller, &edge_id)?;
        edge.active = false;
        tracing::info!(edge = %edge_id.short(), "edge deactivated");

        Ok(LedgerEvent::EdgeDeactivated { edge_id })
    }

    /// Edge ids touching `address`, in creation order. Includes inactive edges.
    pub fn edges_for_node(&self, address: &Address) -> &[Hash] {
        self.node_edges
            .get(address)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn get_edge(&self, edge_id: &Hash) -> Result<&Edge, LedgerError> {
        self.edges
            .get(edge_id)
            .ok_or_else(|| LedgerError::NotFound(format!("edge {edge_id}")))
    }

    /// Whether the edge exists and is active.
    pub fn is_active(&self, edge_id: &Hash) -> bool {
        self.edges.get(edge_id).map(|e| e.active).unwrap_or(false)
    }

    /// Number of edges ever created.
    pub fn edge_count(&self) -> u64 {
        self.edge_count
    }

    /// Active edges created by `address`, in creation order.
    pub fn outgoing_edges(&self, address: &Address) -> Vec<&Edge> {
        self.adjacent(address)
            .filter(|edge| edge.active && edge.node_a == *address)
            .collect()
    }

    /// Active edges pointing at `address`, in creation order.
    pub fn incoming_edges(&self, address: &Address) -> Vec<&Edge> {
        self.adjacent(address)
            .filter(|edge| edge.active && edge.node_b == *address)
            .collect()
    }

    fn adjacent<'a>(&'a self, address: &Address) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges_for_node(address)
            .iter()
            .filter_map(move |id| self.edges.get(id))
    }

    fn owned_active_edge(
        &mut self,
        caller: &Address,
        edge_id: &Hash,
    ) -> Result<&mut Edge, LedgerError> {
        let edge = self
            .edges
            .get_mut(edge_id)
            .ok_or_else(|| LedgerError::NotFound(format!("edge {edge_id}")))?;
        if edge.node_a != *caller {
            return Err(LedgerError::Unauthorized {
                caller: *caller,
                reason: format!("not the creator of edge {}", edge_id.short()),
            });
        }
        if !edge.active {
            return Err(LedgerError::NotActive(format!("edge {edge_id}")));
        }
        Ok(edge)
    }
}

fn check_weight(weight: u64) -> Result<(), LedgerError> {
    if weight == 0 {
        return Err(LedgerError::InvalidWeight(weight));
    }
    Ok(())
}
