use serde::{Deserialize, Serialize};

use crate::error::LedgerError;

/// Fixed-point scale for decay rates: `1_000_000` means "no decay".
pub const DECAY_RATE_SCALE: u64 = 1_000_000;

/// Default decay rate (0.95 per period).
pub const DEFAULT_DECAY_RATE: u64 = 950_000;

/// Default decay period (30 days).
pub const DEFAULT_DECAY_PERIOD_SECS: u64 = 30 * 24 * 60 * 60;

/// Default minimum proof blob length accepted by the format check.
pub const DEFAULT_MIN_PROOF_LEN: usize = 32;

/// Default maximum identity metadata length in bytes.
pub const DEFAULT_MAX_METADATA_LEN: usize = 1024;

/// Tunable parameters of a ledger instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Initial decay rate, scaled by [`DECAY_RATE_SCALE`].
    #[serde(default = "default_decay_rate")]
    pub decay_rate: u64,
    /// Initial decay period in seconds.
    #[serde(default = "default_decay_period_secs")]
    pub decay_period_secs: u64,
    /// Minimum accepted proof blob length in bytes.
    #[serde(default = "default_min_proof_len")]
    pub min_proof_len: usize,
    /// Maximum identity metadata length in bytes.
    #[serde(default = "default_max_metadata_len")]
    pub max_metadata_len: usize,
}

fn default_decay_rate() -> u64 {
    DEFAULT_DECAY_RATE
}
fn default_decay_period_secs() -> u64 {
    DEFAULT_DECAY_PERIOD_SECS
}
fn default_min_proof_len() -> usize {
    DEFAULT_MIN_PROOF_LEN
}
fn default_max_metadata_len() -> usize {
    DEFAULT_MAX_METADATA_LEN
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            decay_rate: DEFAULT_DECAY_RATE,
            decay_period_secs: DEFAULT_DECAY_PERIOD_SECS,
            min_proof_len: DEFAULT_MIN_PROOF_LEN,
            max_metadata_len: DEFAULT_MAX_METADATA_LEN,
        }
    }
}

impl LedgerConfig {
    /// Check the decay parameters against the same rules
    /// `update_decay_parameters` enforces.
    pub fn validate(&self) -> Result<(), LedgerError> {
        validate_decay_parameters(self.decay_rate, self.decay_period_secs)
    }
}

/// `0 < rate <= DECAY_RATE_SCALE` and `period > 0`.
pub fn validate_decay_parameters(rate: u64, period_secs: u64) -> Result<(), LedgerError> {
    if rate == 0 || rate > DECAY_RATE_SCALE {
        return Err(LedgerError::InvalidDecayRate(rate));
    }
    if period_secs == 0 {
        return Err(LedgerError::InvalidDecayPeriod(period_secs));
    }
    Ok(())
}
