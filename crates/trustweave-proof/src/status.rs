use std::fmt;

use serde::{Deserialize, Serialize};
use trustweave_core::{Hash, LedgerError};

/// Lifecycle of a submitted proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProofStatus {
    /// Submitted, awaiting a verifier.
    Pending,
    /// Judged valid. Final state.
    Verified,
    /// Judged invalid. Final state.
    Invalidated,
}

/// Verifier decisions that resolve a proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofTransition {
    Accept,
    Reject,
}

impl ProofTransition {
    pub fn from_validity(is_valid: bool) -> Self {
        if is_valid {
            Self::Accept
        } else {
            Self::Reject
        }
    }
}

impl ProofStatus {
    /// Whether the proof has been resolved either way.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Verified | Self::Invalidated)
    }

    /// Apply a verifier decision to the proof `id`.
    ///
    /// Only `Pending` accepts a transition; any resolved proof fails with
    /// `AlreadyVerified`.
    pub fn transition(self, id: &Hash, decision: ProofTransition) -> Result<Self, LedgerError> {
        let next = match (self, decision) {
            (Self::Pending, ProofTransition::Accept) => Self::Verified,
            (Self::Pending, ProofTransition::Reject) => Self::Invalidated,
            _ => return Err(LedgerError::AlreadyVerified(*id)),
        };

        tracing::debug!(proof = %id.short(), from = %self, to = %next, "proof status transition");
        Ok(next)
    }
}

impl fmt::Display for ProofStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Verified => write!(f, "Verified"),
            Self::Invalidated => write!(f, "Invalidated"),
        }
    }
}
