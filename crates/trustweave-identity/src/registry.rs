use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use trustweave_core::{
    AccessControl, Address, LedgerConfig, LedgerError, LedgerEvent, Role, Timestamp,
};

/// A registered participant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub address: Address,
    pub metadata: String,
    pub registered_at: Timestamp,
    /// Cleared by deactivation. Never set again.
    pub active: bool,
}

/// Registry of identities keyed by address.
///
/// Registration is single-use per address: a deactivated record stays as a
/// tombstone and blocks re-registration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityRegistry {
    access: AccessControl,
    identities: HashMap<Address, Identity>,
    node_count: u64,
    max_metadata_len: usize,
}

impl IdentityRegistry {
    /// Create an empty registry. The deployer holds admin, oracle, and
    /// verifier roles in the registry domain.
    pub fn new(deployer: Address, config: &LedgerConfig) -> Self {
        Self {
            access: AccessControl::new(deployer, &[Role::Oracle, Role::Verifier]),
            identities: HashMap::new(),
            node_count: 0,
            max_metadata_len: config.max_metadata_len,
        }
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut AccessControl {
        &mut self.access
    }

    /// Register the caller with the given metadata.
    pub fn register(
        &mut self,
        caller: Address,
        metadata: String,
        now: Timestamp,
    ) -> Result<LedgerEvent, LedgerError> {
        if caller.is_zero() {
            return Err(LedgerError::InvalidAddress(
                "zero address cannot register".into(),
            ));
        }
        if self.identities.contains_key(&caller) {
            return Err(LedgerError::AlreadyRegistered(caller));
        }
        self.check_metadata(&metadata)?;

        self.identities.insert(
            caller,
            Identity {
                address: caller,
                metadata,
                registered_at: now,
                active: true,
            },
        );
        self.node_count += 1;

        tracing::info!(node = %caller, count = self.node_count, "identity registered");

        Ok(LedgerEvent::NodeRegistered {
            node: caller,
            timestamp: now,
        })
    }

    /// Replace the caller's metadata. The record must exist; it need not be
    /// active.
    pub fn update_metadata(
        &mut self,
        caller: Address,
        metadata: String,
    ) -> Result<LedgerEvent, LedgerError> {
        self.check_metadata(&metadata)?;
        let identity = self
            .identities
            .get_mut(&caller)
            .ok_or_else(|| LedgerError::NotFound(format!("identity {caller}")))?;

        identity.metadata = metadata.clone();
        tracing::debug!(node = %caller, "identity metadata updated");

        Ok(LedgerEvent::NodeUpdated {
            node: caller,
            metadata,
        })
    }

    /// Deactivate the caller's identity. Permanent.
    pub fn deactivate(&mut self, caller: Address) -> Result<LedgerEvent, LedgerError> {
        let identity = self
            .identities
            .get_mut(&caller)
            .ok_or_else(|| LedgerError::NotFound(format!("identity {caller}")))?;
        if !identity.active {
            return Err(LedgerError::NotActive(format!("identity {caller}")));
        }

        identity.active = false;
        tracing::info!(node = %caller, "identity deactivated");

        Ok(LedgerEvent::NodeDeactivated { node: caller })
    }

    /// Whether `address` is registered and active.
    pub fn is_active(&self, address: &Address) -> bool {
        self.identities
            .get(address)
            .map(|identity| identity.active)
            .unwrap_or(false)
    }

    /// Fetch a registered identity.
    pub fn get(&self, address: &Address) -> Result<&Identity, LedgerError> {
        self.identities
            .get(address)
            .ok_or_else(|| LedgerError::NotFound(format!("identity {address}")))
    }

    /// Number of successful registrations.
    pub fn node_count(&self) -> u64 {
        self.node_count
    }

    fn check_metadata(&self, metadata: &str) -> Result<(), LedgerError> {
        if metadata.len() > self.max_metadata_len {
            return Err(LedgerError::InvalidMetadata(format!(
                "{} bytes exceeds limit of {}",
                metadata.len(),
                self.max_metadata_len
            )));
        }
        Ok(())
    }
}
