//! TrustWeave Core: Fundamental types, errors, events, and access control
//! shared by every layer of the social-trust ledger.

pub mod access;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod types;

pub use access::AccessControl;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::LedgerConfig;
pub use error::{ErrorKind, LedgerError};
pub use events::{EventLog, EventRecord, LedgerEvent};
pub use types::{Address, Domain, Hash, Role, Timestamp};
