//! Shared fixtures for the cross-crate integration tests.

use std::sync::Arc;

use trustweave_core::{Address, LedgerConfig, ManualClock, Timestamp};
use trustweave_ledger::Ledger;

/// Clock value every fixture starts at.
pub const T0: Timestamp = 1_700_000_000;

pub fn addr(byte: u8) -> Address {
    Address::repeat_byte(byte)
}

pub fn deployer() -> Address {
    addr(0xde)
}

/// A ledger driven by a clock the test controls.
pub struct Harness {
    pub ledger: Ledger,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(LedgerConfig::default())
    }

    pub fn with_config(config: LedgerConfig) -> Self {
        let clock = ManualClock::new(T0);
        let ledger = Ledger::new(deployer(), config, Arc::new(clock.clone()))
            .unwrap_or_else(|e| panic!("fixture ledger: {e}"));
        tracing::debug!("integration harness ready");
        Self { ledger, clock }
    }

    /// Register each address with a metadata string derived from it.
    pub fn register_all(&mut self, addresses: &[Address]) {
        for address in addresses {
            self.ledger
                .register(*address, format!("ipfs://{}", address.to_hex()))
                .unwrap_or_else(|e| panic!("register {address}: {e}"));
        }
    }

    /// Register `node` and start tracking its reputation.
    pub fn tracked(&mut self, node: Address) {
        self.register_all(&[node]);
        self.ledger
            .initialize_reputation(node, node)
            .unwrap_or_else(|e| panic!("initialize {node}: {e}"));
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
