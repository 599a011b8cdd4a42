//! Append-only notification stream consumed by external indexers.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::types::{Address, Domain, Hash, Role, Timestamp};

/// Capacity of the live subscriber channel. Lagging subscribers miss events
/// but can replay them with [`EventLog::since`].
const SUBSCRIBER_CAPACITY: usize = 1024;

/// A notification emitted by a successful ledger operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LedgerEvent {
    NodeRegistered {
        node: Address,
        timestamp: Timestamp,
    },
    NodeUpdated {
        node: Address,
        metadata: String,
    },
    NodeDeactivated {
        node: Address,
    },
    EdgeCreated {
        edge_id: Hash,
        node_a: Address,
        node_b: Address,
        weight: u64,
        timestamp: Timestamp,
    },
    RelationshipCreated {
        from: Address,
        to: Address,
        edge_id: Hash,
        weight: u64,
    },
    EdgeUpdated {
        edge_id: Hash,
        new_weight: u64,
    },
    EdgeDeactivated {
        edge_id: Hash,
    },
    ReputationUpdated {
        node: Address,
        old_score: u64,
        new_score: u64,
        timestamp: Timestamp,
    },
    DecayParametersUpdated {
        rate: u64,
        period: u64,
    },
    ProofSubmitted {
        proof_id: Hash,
        prover: Address,
        timestamp: Timestamp,
    },
    ProofVerified {
        proof_id: Hash,
        node_a: Address,
        node_b: Address,
    },
    ProofInvalidated {
        proof_id: Hash,
    },
    RoleGranted {
        domain: Domain,
        role: Role,
        account: Address,
        sender: Address,
    },
    RoleRevoked {
        domain: Domain,
        role: Role,
        account: Address,
        sender: Address,
    },
}

impl LedgerEvent {
    /// Short snake_case name of the event, matching its serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NodeRegistered { .. } => "node_registered",
            Self::NodeUpdated { .. } => "node_updated",
            Self::NodeDeactivated { .. } => "node_deactivated",
            Self::EdgeCreated { .. } => "edge_created",
            Self::RelationshipCreated { .. } => "relationship_created",
            Self::EdgeUpdated { .. } => "edge_updated",
            Self::EdgeDeactivated { .. } => "edge_deactivated",
            Self::ReputationUpdated { .. } => "reputation_updated",
            Self::DecayParametersUpdated { .. } => "decay_parameters_updated",
            Self::ProofSubmitted { .. } => "proof_submitted",
            Self::ProofVerified { .. } => "proof_verified",
            Self::ProofInvalidated { .. } => "proof_invalidated",
            Self::RoleGranted { .. } => "role_granted",
            Self::RoleRevoked { .. } => "role_revoked",
        }
    }
}

/// An event together with its position in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Sequence number, starting at 1 and strictly increasing.
    pub seq: u64,
    pub event: LedgerEvent,
}

/// Ordered, replayable event log with live fan-out.
///
/// Appending never waits on subscribers: the broadcast channel drops the
/// oldest message for a subscriber that falls behind.
pub struct EventLog {
    records: Vec<EventRecord>,
    last_seq: u64,
    sender: broadcast::Sender<EventRecord>,
}

impl EventLog {
    /// Create an empty log whose first event will get sequence number 1.
    pub fn new() -> Self {
        Self::resume(0)
    }

    /// Create an empty log that continues numbering after `last_seq`.
    pub fn resume(last_seq: u64) -> Self {
        let (sender, _) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            records: Vec::new(),
            last_seq,
            sender,
        }
    }

    /// Rebuild a log from persisted records. Numbering continues after
    /// `last_seq` even if the oldest records were compacted away.
    pub fn restore(records: Vec<EventRecord>, last_seq: u64) -> Self {
        let mut log = Self::resume(last_seq);
        log.records = records;
        log.records.sort_by_key(|r| r.seq);
        log.records.retain(|r| r.seq <= last_seq);
        log
    }

    /// Append an event and return its sequence number.
    pub fn append(&mut self, event: LedgerEvent) -> u64 {
        self.last_seq += 1;
        let record = EventRecord {
            seq: self.last_seq,
            event,
        };
        tracing::trace!(seq = record.seq, event = record.event.name(), "event appended");
        // No receivers is not an error for an append-only log.
        let _ = self.sender.send(record.clone());
        self.records.push(record);
        self.last_seq
    }

    /// Append events in order.
    pub fn extend<I: IntoIterator<Item = LedgerEvent>>(&mut self, events: I) {
        for event in events {
            self.append(event);
        }
    }

    /// All retained records with `seq > after`, in order.
    pub fn since(&self, after: u64) -> Vec<EventRecord> {
        let start = self.records.partition_point(|r| r.seq <= after);
        self.records[start..].to_vec()
    }

    /// Drop retained records with `seq <= upto`. Numbering is unaffected.
    pub fn compact(&mut self, upto: u64) {
        let keep_from = self.records.partition_point(|r| r.seq <= upto);
        self.records.drain(..keep_from);
    }

    /// Discard records with `seq > upto` and continue numbering after `upto`.
    ///
    /// Live subscribers have already received the discarded records.
    pub fn truncate(&mut self, upto: u64) {
        if upto >= self.last_seq {
            return;
        }
        let keep = self.records.partition_point(|r| r.seq <= upto);
        self.records.truncate(keep);
        self.last_seq = upto;
    }

    /// Sequence number of the most recent event, or 0 if none.
    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Number of retained records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Subscribe to events appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EventRecord> {
        self.sender.subscribe()
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}
