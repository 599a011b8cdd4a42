//! The TrustWeave node orchestrator.
//!
//! Owns the ledger and its storage, runs the HTTP API in a background task,
//! and applies API commands one at a time in its main event loop.

use anyhow::Result;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

use trustweave_core::{Address, Clock, EventRecord, LedgerError};
use trustweave_ledger::Ledger;

use crate::commands::{
    CommandError, ConnectionResponse, EdgeDirection, EventsResponse, IdentityResponse, Mutation,
    MutationResponse, NodeCommand, NodeEdgesResponse, ProofFormatResponse, ProofResponse, Query,
    ReputationResponse,
};
use crate::config::TrustweaveConfig;
use crate::state::NodeState;
use crate::storage::Storage;

/// The TrustWeave node: single writer of the ledger.
pub struct TrustweaveNode {
    /// Node configuration.
    config: TrustweaveConfig,
    /// The ledger, mutated only from the event loop.
    ledger: Ledger,
    /// Persistent storage (None after shutdown).
    storage: Option<Storage>,
    /// Highest event sequence number known to be in storage.
    persisted_seq: u64,
    /// Shared state accessible from HTTP handlers.
    node_state: Option<Arc<NodeState>>,
    /// Receives commands from the HTTP API.
    command_rx: Option<mpsc::Receiver<NodeCommand>>,
}

impl TrustweaveNode {
    /// Open storage and restore the ledger from its last snapshot, or create
    /// a fresh ledger for the configured deployer.
    pub fn open(config: TrustweaveConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;

        let storage = Storage::open(&config.storage.data_dir)?;
        tracing::info!(path = %config.storage.data_dir.display(), "storage initialized");

        // Stored events stay on disk; reads page through them on demand.
        let ledger = match storage.load_snapshot()? {
            Some(snapshot) => Ledger::from_snapshot(snapshot, Vec::new(), clock),
            None => {
                let deployer = config.admin.deployer.ok_or_else(|| {
                    anyhow::anyhow!("no stored ledger and no admin.deployer configured")
                })?;
                let ledger = Ledger::new(deployer, config.ledger.clone(), clock)?;
                storage.persist(&ledger.snapshot(), &[])?;
                ledger
            }
        };

        Ok(Self {
            config,
            persisted_seq: ledger.last_event_seq(),
            ledger,
            storage: Some(storage),
            node_state: None,
            command_rx: None,
        })
    }

    /// Start the HTTP API. Returns the address it is bound to.
    pub async fn start(&mut self) -> Result<SocketAddr> {
        tracing::info!("starting TrustWeave node");

        // Create the NodeCommand channel (HTTP API → main event loop)
        let (command_tx, command_rx) =
            mpsc::channel::<NodeCommand>(self.config.api.command_capacity);
        let node_state = Arc::new(NodeState::new(command_tx));

        let api_addr: SocketAddr = self.config.api_addr().parse()?;
        if !self.config.api_is_loopback() {
            tracing::warn!(
                addr = %api_addr,
                "API trusts the x-caller header and is reachable beyond loopback"
            );
        }
        let listener = tokio::net::TcpListener::bind(api_addr).await?;
        let local_addr = listener.local_addr()?;

        let api_state = node_state.clone();
        tokio::spawn(async move {
            if let Err(e) = crate::api::serve(listener, api_state).await {
                tracing::error!(error = %e, "HTTP API server error");
            }
        });

        self.node_state = Some(node_state);
        self.command_rx = Some(command_rx);

        Ok(local_addr)
    }

    /// Run the node's main event loop until the command channel closes.
    pub async fn run(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("node not started"))?;

        tracing::info!("entering main event loop");

        while let Some(cmd) = command_rx.recv().await {
            self.handle_command(cmd);
        }

        tracing::info!("API command channel closed");
        Ok(())
    }

    /// Gracefully shut down the node.
    pub async fn shutdown(&mut self) -> Result<()> {
        tracing::info!("shutting down TrustWeave node");

        self.node_state = None;
        self.command_rx = None;

        if let Some(storage) = self.storage.take() {
            drop(storage);
            tracing::info!("storage closed");
        }

        tracing::info!("TrustWeave node shut down");
        Ok(())
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Handle a command from the HTTP API.
    pub fn handle_command(&mut self, cmd: NodeCommand) {
        match cmd {
            NodeCommand::Mutate {
                caller,
                mutation,
                reply,
            } => {
                let result = self.mutate(caller, mutation);
                let _ = reply.send(result);
            }
            NodeCommand::Query { query, reply } => {
                let _ = reply.send(self.query(query));
            }
        }
    }

    /// Apply a mutation, then persist every unstored event with a fresh
    /// snapshot. If the write fails the ledger is rolled back, so a
    /// mutation either reaches storage or leaves no trace.
    fn mutate(
        &mut self,
        caller: Address,
        mutation: Mutation,
    ) -> Result<MutationResponse, CommandError> {
        let name = mutation.name();
        let before = self.ledger.last_event_seq();
        let checkpoint = self.storage.as_ref().map(|_| self.ledger.snapshot());

        let mut response = match apply(&mut self.ledger, caller, mutation) {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(
                    op = name,
                    %caller,
                    kind = %e.kind(),
                    error = %e,
                    "mutation rejected"
                );
                return Err(e.into());
            }
        };

        response.last_event_seq = self.ledger.last_event_seq();
        response.events = response.last_event_seq - before;

        if let (Some(storage), Some(checkpoint)) = (&self.storage, checkpoint) {
            let pending = self.ledger.events_since(self.persisted_seq);
            if let Err(e) = storage.persist(&self.ledger.snapshot(), &pending) {
                tracing::error!(op = name, error = %e, "failed to persist ledger state");
                self.ledger.restore(checkpoint);
                return Err(CommandError::Storage(e.to_string()));
            }
            self.persisted_seq = response.last_event_seq;
            self.ledger.compact_events(self.persisted_seq);
        }

        tracing::info!(
            op = name,
            %caller,
            events = response.events,
            seq = response.last_event_seq,
            "mutation applied"
        );
        Ok(response)
    }

    /// Up to `limit` events after `after`: stored records first, then any
    /// not yet written.
    fn events_since(&self, after: u64, limit: usize) -> Result<Vec<EventRecord>, CommandError> {
        let mut events = match &self.storage {
            Some(storage) => storage
                .events_since(after, limit)
                .map_err(|e| CommandError::Storage(e.to_string()))?,
            None => Vec::new(),
        };
        let cursor = events.last().map_or(after, |r| r.seq);
        let room = limit.saturating_sub(events.len());
        events.extend(self.ledger.events_since(cursor).into_iter().take(room));
        Ok(events)
    }

    fn query(&self, query: Query) -> Result<serde_json::Value, CommandError> {
        let ledger = &self.ledger;
        match query {
            Query::Status => to_json(&ledger.status()),
            Query::Identity { address } => to_json(&IdentityResponse {
                identity: ledger.identity(&address)?.clone(),
            }),
            Query::Edge { edge_id } => to_json(ledger.edge(&edge_id)?),
            Query::NodeEdges { address, direction } => {
                let edges = match direction {
                    EdgeDirection::All => ledger
                        .edges_for_node(&address)
                        .iter()
                        .map(|id| ledger.edge(id).cloned())
                        .collect::<Result<Vec<_>, LedgerError>>()?,
                    EdgeDirection::Outgoing => {
                        ledger.graph().outgoing_edges(&address).into_iter().cloned().collect()
                    }
                    EdgeDirection::Incoming => {
                        ledger.graph().incoming_edges(&address).into_iter().cloned().collect()
                    }
                };
                to_json(&NodeEdgesResponse {
                    address,
                    direction,
                    edges,
                })
            }
            Query::Reputation { node } => {
                let record = ledger.reputation_record(&node)?;
                to_json(&ReputationResponse {
                    node,
                    score: ledger.get_reputation(&node)?,
                    stored_score: record.score,
                    last_updated: record.last_updated,
                    update_count: record.update_count,
                })
            }
            Query::Proof { proof_id } => to_json(&ProofResponse {
                proof: ledger.proof(&proof_id)?.clone(),
            }),
            Query::Connection { node_a, node_b } => to_json(&ConnectionResponse {
                node_a,
                node_b,
                verified: ledger.is_connection_verified(&node_a, &node_b),
                connection: ledger.connection(&node_a, &node_b).cloned(),
            }),
            Query::ProofFormat {
                proof,
                public_inputs,
            } => to_json(&ProofFormatResponse {
                valid: ledger.verify_proof_format(&proof, &public_inputs)?,
            }),
            Query::EventsSince { after, limit } => {
                let limit = limit
                    .unwrap_or(self.config.api.events_page_limit)
                    .min(self.config.api.events_page_limit);
                to_json(&EventsResponse {
                    last_event_seq: ledger.last_event_seq(),
                    events: self.events_since(after, limit)?,
                })
            }
        }
    }
}

/// Dispatch one mutation to the ledger.
fn apply(
    ledger: &mut Ledger,
    caller: Address,
    mutation: Mutation,
) -> Result<MutationResponse, LedgerError> {
    let mut response = MutationResponse::default();
    match mutation {
        Mutation::Register { metadata } => ledger.register(caller, metadata)?,
        Mutation::UpdateMetadata { metadata } => ledger.update_metadata(caller, metadata)?,
        Mutation::Deactivate => ledger.deactivate(caller)?,
        Mutation::CreateRelationship {
            to,
            weight,
            relationship_hash,
        } => {
            response.edge_id =
                Some(ledger.create_relationship(caller, to, weight, relationship_hash)?);
        }
        Mutation::UpdateEdgeWeight {
            edge_id,
            new_weight,
        } => ledger.update_edge_weight(caller, edge_id, new_weight)?,
        Mutation::DeactivateEdge { edge_id } => ledger.deactivate_edge(caller, edge_id)?,
        Mutation::InitializeReputation { node } => {
            ledger.initialize_reputation(caller, node)?;
            response.score = Some(ledger.get_reputation(&node)?);
        }
        Mutation::UpdateReputation { node, score } => {
            ledger.update_reputation(caller, node, score)?;
            response.score = Some(score);
        }
        Mutation::BatchUpdateReputation { nodes, scores } => {
            ledger.batch_update_reputation(caller, &nodes, &scores)?
        }
        Mutation::ApplyDecay { node } => {
            response.score = Some(ledger.apply_decay(caller, node)?);
        }
        Mutation::UpdateDecayParameters { rate, period } => {
            ledger.update_decay_parameters(caller, rate, period)?
        }
        Mutation::SubmitProof {
            proof_hash,
            public_inputs,
        } => {
            response.proof_id = Some(ledger.submit_proof(caller, proof_hash, &public_inputs)?);
        }
        Mutation::VerifyProof {
            proof_id,
            node_a,
            node_b,
            is_valid,
        } => ledger.verify_proof(caller, proof_id, node_a, node_b, is_valid)?,
        Mutation::BatchVerifyProofs {
            proof_ids,
            nodes_a,
            nodes_b,
            valids,
        } => ledger.batch_verify_proofs(caller, &proof_ids, &nodes_a, &nodes_b, &valids)?,
        Mutation::GrantRole {
            domain,
            role,
            account,
        } => {
            response.changed = Some(ledger.grant_role(caller, domain, role, account)?);
        }
        Mutation::RevokeRole {
            domain,
            role,
            account,
        } => {
            response.changed = Some(ledger.revoke_role(caller, domain, role, account)?);
        }
    }
    Ok(response)
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<serde_json::Value, CommandError> {
    serde_json::to_value(value).map_err(|e| CommandError::Internal(e.to_string()))
}
