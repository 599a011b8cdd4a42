use std::sync::Arc;

use tokio::sync::broadcast;

use trustweave_core::{
    AccessControl, Address, Clock, Domain, EventLog, EventRecord, Hash, LedgerConfig,
    LedgerError, LedgerEvent, Role, Timestamp,
};
use trustweave_identity::{Edge, GraphStore, Identity, IdentityRegistry};
use trustweave_proof::{Proof, ProofRegistry, VerifiedConnection};
use trustweave_reputation::{ReputationLedger, ReputationRecord};

use crate::snapshot::{LedgerSnapshot, LedgerStatus};

/// The social-trust ledger.
///
/// Owns the identity registry, relationship graph, reputation ledger, and
/// proof registry, plus the event log they feed. Every mutating method takes
/// the calling principal, reads the clock once, and either applies fully and
/// appends its events or returns an error having changed nothing.
pub struct Ledger {
    config: LedgerConfig,
    identities: IdentityRegistry,
    graph: GraphStore,
    reputation: ReputationLedger,
    proofs: ProofRegistry,
    events: EventLog,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Create an empty ledger. `deployer` receives the deploy-time roles of
    /// every component.
    pub fn new(
        deployer: Address,
        config: LedgerConfig,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, LedgerError> {
        if deployer.is_zero() {
            return Err(LedgerError::InvalidAddress("deployer is the zero address".into()));
        }
        let reputation = ReputationLedger::new(deployer, &config)?;

        tracing::info!(
            %deployer,
            decay_rate = config.decay_rate,
            decay_period = config.decay_period_secs,
            "ledger created"
        );

        Ok(Self {
            identities: IdentityRegistry::new(deployer, &config),
            graph: GraphStore::new(),
            reputation,
            proofs: ProofRegistry::new(deployer, &config),
            events: EventLog::new(),
            clock,
            config,
        })
    }

    /// Rebuild a ledger from a snapshot and its retained event history.
    pub fn from_snapshot(
        snapshot: LedgerSnapshot,
        history: Vec<EventRecord>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        tracing::info!(
            nodes = snapshot.identities.node_count(),
            edges = snapshot.graph.edge_count(),
            last_event_seq = snapshot.last_event_seq,
            "ledger restored from snapshot"
        );
        Self {
            config: snapshot.config,
            identities: snapshot.identities,
            graph: snapshot.graph,
            reputation: snapshot.reputation,
            proofs: snapshot.proofs,
            events: EventLog::restore(history, snapshot.last_event_seq),
            clock,
        }
    }

    /// Capture every table, index, counter, and nonce.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            config: self.config.clone(),
            identities: self.identities.clone(),
            graph: self.graph.clone(),
            reputation: self.reputation.clone(),
            proofs: self.proofs.clone(),
            last_event_seq: self.events.last_seq(),
        }
    }

    /// Roll every table back to `snapshot`, discarding events appended after
    /// it. The clock and live subscribers are kept.
    pub fn restore(&mut self, snapshot: LedgerSnapshot) {
        tracing::warn!(
            from_seq = self.events.last_seq(),
            to_seq = snapshot.last_event_seq,
            "ledger rolled back to snapshot"
        );
        self.config = snapshot.config;
        self.identities = snapshot.identities;
        self.graph = snapshot.graph;
        self.reputation = snapshot.reputation;
        self.proofs = snapshot.proofs;
        self.events.truncate(snapshot.last_event_seq);
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // ---- identities ----

    pub fn register(&mut self, caller: Address, metadata: String) -> Result<(), LedgerError> {
        let now = self.now();
        let event = self.identities.register(caller, metadata, now)?;
        self.events.append(event);
        Ok(())
    }

    pub fn update_metadata(
        &mut self,
        caller: Address,
        metadata: String,
    ) -> Result<(), LedgerError> {
        let event = self.identities.update_metadata(caller, metadata)?;
        self.events.append(event);
        Ok(())
    }

    pub fn deactivate(&mut self, caller: Address) -> Result<(), LedgerError> {
        let event = self.identities.deactivate(caller)?;
        self.events.append(event);
        Ok(())
    }

    pub fn identity(&self, address: &Address) -> Result<&Identity, LedgerError> {
        self.identities.get(address)
    }

    pub fn is_active(&self, address: &Address) -> bool {
        self.identities.is_active(address)
    }

    pub fn node_count(&self) -> u64 {
        self.identities.node_count()
    }

    // ---- relationships ----

    /// Open a relationship from `caller` to `to`. The caller's identity must
    /// be active; `to` need not be registered.
    pub fn create_relationship(
        &mut self,
        caller: Address,
        to: Address,
        weight: u64,
        relationship_hash: Hash,
    ) -> Result<Hash, LedgerError> {
        if !self.identities.is_active(&caller) {
            return Err(LedgerError::NotActive(format!("sender identity {caller}")));
        }
        if caller == to {
            return Err(LedgerError::SelfRelationship(caller));
        }

        let now = self.now();
        let (edge_id, created) = self
            .graph
            .create_edge(caller, to, weight, relationship_hash, now)?;
        self.events.append(created);
        self.events.append(LedgerEvent::RelationshipCreated {
            from: caller,
            to,
            edge_id,
            weight,
        });
        Ok(edge_id)
    }

    pub fn update_edge_weight(
        &mut self,
        caller: Address,
        edge_id: Hash,
        new_weight: u64,
    ) -> Result<(), LedgerError> {
        let event = self.graph.update_weight(caller, edge_id, new_weight)?;
        self.events.append(event);
        Ok(())
    }

    pub fn deactivate_edge(&mut self, caller: Address, edge_id: Hash) -> Result<(), LedgerError> {
        let event = self.graph.deactivate_edge(caller, edge_id)?;
        self.events.append(event);
        Ok(())
    }

    pub fn edge(&self, edge_id: &Hash) -> Result<&Edge, LedgerError> {
        self.graph.get_edge(edge_id)
    }

    pub fn edges_for_node(&self, address: &Address) -> &[Hash] {
        self.graph.edges_for_node(address)
    }

    pub fn is_edge_active(&self, edge_id: &Hash) -> bool {
        self.graph.is_active(edge_id)
    }

    pub fn edge_count(&self) -> u64 {
        self.graph.edge_count()
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    // ---- reputation ----

    /// Start tracking `node`'s reputation. Open to any caller.
    pub fn initialize_reputation(
        &mut self,
        caller: Address,
        node: Address,
    ) -> Result<(), LedgerError> {
        let now = self.now();
        let event = self.reputation.initialize(&self.identities, node, now)?;
        tracing::debug!(%caller, %node, "reputation initialization requested");
        self.events.append(event);
        Ok(())
    }

    pub fn update_reputation(
        &mut self,
        caller: Address,
        node: Address,
        score: u64,
    ) -> Result<(), LedgerError> {
        let now = self.now();
        let event = self.reputation.update(caller, node, score, now)?;
        self.events.append(event);
        Ok(())
    }

    pub fn batch_update_reputation(
        &mut self,
        caller: Address,
        nodes: &[Address],
        scores: &[u64],
    ) -> Result<(), LedgerError> {
        let now = self.now();
        let events = self.reputation.batch_update(caller, nodes, scores, now)?;
        self.events.extend(events);
        Ok(())
    }

    /// Persist decay for `node` and return the stored score. Open to any
    /// caller.
    pub fn apply_decay(&mut self, caller: Address, node: Address) -> Result<u64, LedgerError> {
        let now = self.now();
        if let Some(event) = self.reputation.apply_decay(node, now)? {
            tracing::debug!(%caller, %node, "decay persisted");
            self.events.append(event);
        }
        Ok(self.reputation.record(&node)?.score)
    }

    pub fn update_decay_parameters(
        &mut self,
        caller: Address,
        rate: u64,
        period: u64,
    ) -> Result<(), LedgerError> {
        let event = self.reputation.update_decay_parameters(caller, rate, period)?;
        self.events.append(event);
        Ok(())
    }

    /// Decayed score of `node` as of now. Never mutates.
    pub fn get_reputation(&self, node: &Address) -> Result<u64, LedgerError> {
        self.reputation.get_reputation(node, self.now())
    }

    pub fn reputation_record(&self, node: &Address) -> Result<&ReputationRecord, LedgerError> {
        self.reputation.record(node)
    }

    pub fn decay_parameters(&self) -> (u64, u64) {
        self.reputation.decay_parameters()
    }

    // ---- proofs ----

    pub fn submit_proof(
        &mut self,
        caller: Address,
        proof_hash: Hash,
        public_inputs: &[u64],
    ) -> Result<Hash, LedgerError> {
        let now = self.now();
        let (proof_id, event) = self
            .proofs
            .submit_proof(caller, proof_hash, public_inputs, now)?;
        self.events.append(event);
        Ok(proof_id)
    }

    pub fn verify_proof(
        &mut self,
        caller: Address,
        proof_id: Hash,
        node_a: Address,
        node_b: Address,
        is_valid: bool,
    ) -> Result<(), LedgerError> {
        let now = self.now();
        let event = self
            .proofs
            .verify_proof(caller, proof_id, node_a, node_b, is_valid, now)?;
        self.events.append(event);
        Ok(())
    }

    pub fn batch_verify_proofs(
        &mut self,
        caller: Address,
        proof_ids: &[Hash],
        nodes_a: &[Address],
        nodes_b: &[Address],
        valids: &[bool],
    ) -> Result<(), LedgerError> {
        let now = self.now();
        let events = self
            .proofs
            .batch_verify_proofs(caller, proof_ids, nodes_a, nodes_b, valids, now)?;
        self.events.extend(events);
        Ok(())
    }

    pub fn proof(&self, proof_id: &Hash) -> Result<&Proof, LedgerError> {
        self.proofs.get_proof(proof_id)
    }

    pub fn is_proof_verified(&self, proof_id: &Hash) -> bool {
        self.proofs.is_proof_verified(proof_id)
    }

    pub fn is_connection_verified(&self, a: &Address, b: &Address) -> bool {
        self.proofs.is_connection_verified(a, b)
    }

    pub fn connection(&self, a: &Address, b: &Address) -> Option<&VerifiedConnection> {
        self.proofs.connection(a, b)
    }

    pub fn verify_proof_format(
        &self,
        proof: &[u8],
        public_inputs: &[u64],
    ) -> Result<bool, LedgerError> {
        self.proofs.verify_proof_format(proof, public_inputs)
    }

    // ---- roles ----

    /// Grant `role` in `domain`. Returns whether membership changed; an
    /// event is appended only if it did.
    pub fn grant_role(
        &mut self,
        caller: Address,
        domain: Domain,
        role: Role,
        account: Address,
    ) -> Result<bool, LedgerError> {
        let changed = self.access_mut(domain).grant(&caller, role, account)?;
        if changed {
            self.events.append(LedgerEvent::RoleGranted {
                domain,
                role,
                account,
                sender: caller,
            });
        }
        Ok(changed)
    }

    /// Revoke `role` in `domain`. Returns whether membership changed.
    pub fn revoke_role(
        &mut self,
        caller: Address,
        domain: Domain,
        role: Role,
        account: Address,
    ) -> Result<bool, LedgerError> {
        let changed = self.access_mut(domain).revoke(&caller, role, account)?;
        if changed {
            self.events.append(LedgerEvent::RoleRevoked {
                domain,
                role,
                account,
                sender: caller,
            });
        }
        Ok(changed)
    }

    pub fn has_role(&self, domain: Domain, role: Role, account: &Address) -> bool {
        self.access(domain).has_role(role, account)
    }

    pub fn access(&self, domain: Domain) -> &AccessControl {
        match domain {
            Domain::Registry => self.identities.access(),
            Domain::Reputation => self.reputation.access(),
            Domain::Proofs => self.proofs.access(),
        }
    }

    fn access_mut(&mut self, domain: Domain) -> &mut AccessControl {
        match domain {
            Domain::Registry => self.identities.access_mut(),
            Domain::Reputation => self.reputation.access_mut(),
            Domain::Proofs => self.proofs.access_mut(),
        }
    }

    // ---- events and status ----

    /// Retained events with `seq > after`.
    pub fn events_since(&self, after: u64) -> Vec<EventRecord> {
        self.events.since(after)
    }

    pub fn last_event_seq(&self) -> u64 {
        self.events.last_seq()
    }

    /// Release retained events with `seq <= upto` from memory once they are
    /// stored elsewhere. Numbering is unaffected.
    pub fn compact_events(&mut self, upto: u64) {
        self.events.compact(upto);
    }

    /// Live feed of events appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.events.subscribe()
    }

    pub fn status(&self) -> LedgerStatus {
        let (decay_rate, decay_period) = self.reputation.decay_parameters();
        LedgerStatus {
            node_count: self.identities.node_count(),
            edge_count: self.graph.edge_count(),
            reputation_records: self.reputation.len() as u64,
            total_proofs: self.proofs.total_proofs(),
            total_verified_proofs: self.proofs.total_verified_proofs(),
            decay_rate,
            decay_period,
            last_event_seq: self.events.last_seq(),
        }
    }
}
