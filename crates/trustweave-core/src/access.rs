//! Role membership store consulted by every gated operation.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::LedgerError;
use crate::types::{Address, Role};

/// Role membership sets for one component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControl {
    members: BTreeMap<Role, BTreeSet<Address>>,
}

impl AccessControl {
    /// Create a role store where `deployer` holds `Admin` plus `extra_roles`.
    pub fn new(deployer: Address, extra_roles: &[Role]) -> Self {
        let mut access = Self::default();
        access.insert(Role::Admin, deployer);
        for role in extra_roles {
            access.insert(*role, deployer);
        }
        access
    }

    /// Whether `principal` holds `role`.
    pub fn has_role(&self, role: Role, principal: &Address) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(principal))
            .unwrap_or(false)
    }

    /// Fail with `Unauthorized` unless `principal` holds `role`.
    pub fn require(&self, role: Role, principal: &Address) -> Result<(), LedgerError> {
        if self.has_role(role, principal) {
            Ok(())
        } else {
            Err(LedgerError::missing_role(*principal, role))
        }
    }

    /// Fail with `Unauthorized` unless `principal` holds at least one of `roles`.
    pub fn require_any(&self, roles: &[Role], principal: &Address) -> Result<(), LedgerError> {
        if roles.iter().any(|role| self.has_role(*role, principal)) {
            return Ok(());
        }
        let names: Vec<String> = roles.iter().map(Role::to_string).collect();
        Err(LedgerError::Unauthorized {
            caller: *principal,
            reason: format!("requires one of [{}]", names.join(", ")),
        })
    }

    /// Grant `role` to `principal`. Only an admin may grant.
    ///
    /// Returns whether membership changed.
    pub fn grant(
        &mut self,
        caller: &Address,
        role: Role,
        principal: Address,
    ) -> Result<bool, LedgerError> {
        self.require(Role::Admin, caller)?;
        if principal.is_zero() {
            return Err(LedgerError::InvalidAddress(
                "cannot grant a role to the zero address".into(),
            ));
        }
        let changed = self.insert(role, principal);
        if changed {
            tracing::info!(%role, account = %principal, sender = %caller, "role granted");
        }
        Ok(changed)
    }

    /// Revoke `role` from `principal`. Only an admin may revoke.
    ///
    /// Returns whether membership changed.
    pub fn revoke(
        &mut self,
        caller: &Address,
        role: Role,
        principal: Address,
    ) -> Result<bool, LedgerError> {
        self.require(Role::Admin, caller)?;
        let changed = self
            .members
            .get_mut(&role)
            .map(|set| set.remove(&principal))
            .unwrap_or(false);
        if changed {
            tracing::info!(%role, account = %principal, sender = %caller, "role revoked");
        }
        Ok(changed)
    }

    /// Holders of `role`, sorted.
    pub fn members(&self, role: Role) -> Vec<Address> {
        self.members
            .get(&role)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    fn insert(&mut self, role: Role, principal: Address) -> bool {
        self.members.entry(role).or_default().insert(principal)
    }
}
