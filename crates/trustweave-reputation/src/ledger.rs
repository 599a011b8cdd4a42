use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use trustweave_core::config::validate_decay_parameters;
use trustweave_core::{
    AccessControl, Address, LedgerConfig, LedgerError, LedgerEvent, Role, Timestamp,
};
use trustweave_identity::IdentityRegistry;

use crate::decay::{decayed_score, periods_elapsed};
use crate::score::{check_bounds, INITIAL_SCORE};

/// Stored reputation of one node.
///
/// `score` is the value as of `last_updated`; readers apply decay on top.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub node: Address,
    pub score: u64,
    pub last_updated: Timestamp,
    /// Absolute updates only. Decay does not count.
    pub update_count: u64,
}

/// Per-node decaying reputation scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationLedger {
    access: AccessControl,
    records: HashMap<Address, ReputationRecord>,
    decay_rate: u64,
    decay_period: u64,
}

impl ReputationLedger {
    /// Create an empty ledger. The deployer holds every role.
    pub fn new(deployer: Address, config: &LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self {
            access: AccessControl::new(deployer, &[Role::Oracle, Role::Updater, Role::Verifier]),
            records: HashMap::new(),
            decay_rate: config.decay_rate,
            decay_period: config.decay_period_secs,
        })
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    /// Start tracking `node` at [`INITIAL_SCORE`]. The node's identity must
    /// be active.
    pub fn initialize(
        &mut self,
        registry: &IdentityRegistry,
        node: Address,
        now: Timestamp,
    ) -> Result<LedgerEvent, LedgerError> {
        if !registry.is_active(&node) {
            return Err(LedgerError::NotActive(format!("identity {node}")));
        }
        if self.records.contains_key(&node) {
            return Err(LedgerError::AlreadyInitialized(node));
        }

        self.records.insert(
            node,
            ReputationRecord {
                node,
                score: INITIAL_SCORE,
                last_updated: now,
                update_count: 0,
            },
        );
        tracing::info!(%node, score = INITIAL_SCORE, "reputation initialized");

        Ok(LedgerEvent::ReputationUpdated {
            node,
            old_score: 0,
            new_score: INITIAL_SCORE,
            timestamp: now,
        })
    }

    /// Overwrite a node's score. Requires the oracle or updater role.
    pub fn update(
        &mut self,
        caller: Address,
        node: Address,
        new_score: u64,
        now: Timestamp,
    ) -> Result<LedgerEvent, LedgerError> {
        self.access.require_any(&[Role::Oracle, Role::Updater], &caller)?;
        check_bounds(new_score)?;
        self.write_score(node, new_score, now)
    }

    /// Overwrite several scores at once. Requires the oracle role.
    ///
    /// Every pair is validated before any is applied, so a failure leaves
    /// all records untouched.
    pub fn batch_update(
        &mut self,
        caller: Address,
        nodes: &[Address],
        scores: &[u64],
        now: Timestamp,
    ) -> Result<Vec<LedgerEvent>, LedgerError> {
        self.access.require(Role::Oracle, &caller)?;
        if nodes.len() != scores.len() {
            return Err(LedgerError::ArrayLengthMismatch(format!(
                "{} nodes, {} scores",
                nodes.len(),
                scores.len()
            )));
        }
        for (node, score) in nodes.iter().zip(scores) {
            check_bounds(*score)?;
            self.record(node)?;
        }

        let events = nodes
            .iter()
            .zip(scores)
            .map(|(node, score)| self.write_score(*node, *score, now))
            .collect::<Result<Vec<_>, _>>()?;
        tracing::info!(count = events.len(), "batch reputation update applied");
        Ok(events)
    }

    /// Persist the decayed score of `node`.
    ///
    /// Returns `None` when no full period has elapsed; nothing changes in
    /// that case, including `last_updated`.
    pub fn apply_decay(
        &mut self,
        node: Address,
        now: Timestamp,
    ) -> Result<Option<LedgerEvent>, LedgerError> {
        let (rate, period) = (self.decay_rate, self.decay_period);
        let record = self
            .records
            .get_mut(&node)
            .ok_or_else(|| LedgerError::NotFound(format!("reputation {node}")))?;

        if periods_elapsed(record.last_updated, now, period) == 0 {
            return Ok(None);
        }

        let old_score = record.score;
        record.score = decayed_score(old_score, record.last_updated, now, rate, period);
        record.last_updated = now;
        tracing::debug!(%node, old_score, new_score = record.score, "decay applied");

        Ok(Some(LedgerEvent::ReputationUpdated {
            node,
            old_score,
            new_score: record.score,
            timestamp: now,
        }))
    }

    /// Current score of `node` with decay applied, without persisting it.
    pub fn get_reputation(&self, node: &Address, now: Timestamp) -> Result<u64, LedgerError> {
        let record = self.record(node)?;
        Ok(decayed_score(
            record.score,
            record.last_updated,
            now,
            self.decay_rate,
            self.decay_period,
        ))
    }

    /// Change the decay rate and period. Requires the admin role.
    pub fn update_decay_parameters(
        &mut self,
        caller: Address,
        rate: u64,
        period: u64,
    ) -> Result<LedgerEvent, LedgerError> {
        self.access.require(Role::Admin, &caller)?;
        validate_decay_parameters(rate, period)?;

        self.decay_rate = rate;
        self.decay_period = period;
        tracing::info!(rate, period, "decay parameters updated");

        Ok(LedgerEvent::DecayParametersUpdated { rate, period })
    }

    /// The stored record of `node`, before decay.
    pub fn record(&self, node: &Address) -> Result<&ReputationRecord, LedgerError> {
        self.records
            .get(node)
            .ok_or_else(|| LedgerError::NotFound(format!("reputation {node}")))
    }

    /// `(rate, period_secs)`.
    pub fn decay_parameters(&self) -> (u64, u64) {
        (self.decay_rate, self.decay_period)
    }

    /// Number of initialized records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn write_score(
        &mut self,
        node: Address,
        new_score: u64,
        now: Timestamp,
    ) -> Result<LedgerEvent, LedgerError> {
        let record = self
            .records
            .get_mut(&node)
            .ok_or_else(|| LedgerError::NotFound(format!("reputation {node}")))?;
        let old_score = record.score;
        record.score = new_score;
        record.last_updated = now;
        record.update_count += 1;
        tracing::info!(%node, old_score, new_score, "reputation updated");

        Ok(LedgerEvent::ReputationUpdated {
            node,
            old_score,
            new_score,
            timestamp: now,
        })
    }
}
