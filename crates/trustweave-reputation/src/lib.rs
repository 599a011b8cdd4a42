//! TrustWeave Reputation Layer
//!
//! - Score bounds and the initial score granted on initialization
//! - Pure decay arithmetic shared by the read and write paths
//! - Reputation ledger: role-gated absolute updates, atomic batches, and
//!   persisted decay

pub mod decay;
pub mod ledger;
pub mod score;

pub use decay::{decayed_score, periods_elapsed};
pub use ledger::{ReputationLedger, ReputationRecord};
pub use score::{INITIAL_SCORE, MAX_SCORE, MIN_SCORE};
