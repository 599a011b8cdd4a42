//! TrustWeave Ledger: the store object owning every table of the
//! social-trust ledger.
//!
//! All mutation goes through [`Ledger`], one operation at a time. Each
//! operation validates fully before it mutates and appends its events to
//! the ledger's [`trustweave_core::EventLog`] only on success.

pub mod ledger;
pub mod snapshot;

pub use ledger::Ledger;
pub use snapshot::{LedgerSnapshot, LedgerStatus};
