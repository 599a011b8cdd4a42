use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Address, Hash, Role};

/// Ledger operation errors.
///
/// Every mutating operation validates before it mutates, so any of these
/// leaves all tables exactly as they were before the call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("identity already registered: {0}")]
    AlreadyRegistered(Address),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not active: {0}")]
    NotActive(String),

    #[error("self-relationship not allowed: {0}")]
    SelfRelationship(Address),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("weight must be positive, got {0}")]
    InvalidWeight(u64),

    #[error("{caller} is not authorized: {reason}")]
    Unauthorized { caller: Address, reason: String },

    #[error("score {score} out of bounds [{min}, {max}]")]
    ScoreOutOfBounds { score: u64, min: u64, max: u64 },

    #[error("array length mismatch: {0}")]
    ArrayLengthMismatch(String),

    #[error("proof already verified: {0}")]
    AlreadyVerified(Hash),

    #[error("reputation already initialized: {0}")]
    AlreadyInitialized(Address),

    #[error("invalid decay rate {0}: must be in (0, 1000000]")]
    InvalidDecayRate(u64),

    #[error("invalid decay period {0}: must be positive")]
    InvalidDecayPeriod(u64),

    #[error("invalid proof format: {0}")]
    InvalidProofFormat(String),

    #[error("invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("invalid encoding: {0}")]
    InvalidEncoding(String),
}

impl LedgerError {
    /// Shorthand for a missing-role failure.
    pub fn missing_role(caller: Address, role: Role) -> Self {
        Self::Unauthorized {
            caller,
            reason: format!("missing role {role}"),
        }
    }

    /// The fieldless kind of this error, for programmatic matching.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyRegistered(_) => ErrorKind::AlreadyRegistered,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NotActive(_) => ErrorKind::NotActive,
            Self::SelfRelationship(_) => ErrorKind::SelfRelationship,
            Self::InvalidAddress(_) => ErrorKind::InvalidAddress,
            Self::InvalidWeight(_) => ErrorKind::InvalidWeight,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::ScoreOutOfBounds { .. } => ErrorKind::ScoreOutOfBounds,
            Self::ArrayLengthMismatch(_) => ErrorKind::ArrayLengthMismatch,
            Self::AlreadyVerified(_) => ErrorKind::AlreadyVerified,
            Self::AlreadyInitialized(_) => ErrorKind::AlreadyInitialized,
            Self::InvalidDecayRate(_) => ErrorKind::InvalidDecayRate,
            Self::InvalidDecayPeriod(_) => ErrorKind::InvalidDecayPeriod,
            Self::InvalidProofFormat(_) => ErrorKind::InvalidProofFormat,
            Self::InvalidMetadata(_) => ErrorKind::InvalidMetadata,
            Self::InvalidEncoding(_) => ErrorKind::InvalidEncoding,
        }
    }
}

/// Identifying kind of a [`LedgerError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    AlreadyRegistered,
    NotFound,
    NotActive,
    SelfRelationship,
    InvalidAddress,
    InvalidWeight,
    Unauthorized,
    ScoreOutOfBounds,
    ArrayLengthMismatch,
    AlreadyVerified,
    AlreadyInitialized,
    InvalidDecayRate,
    InvalidDecayPeriod,
    InvalidProofFormat,
    InvalidMetadata,
    InvalidEncoding,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}
