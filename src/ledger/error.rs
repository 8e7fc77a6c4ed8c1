//! Ledger error taxonomy.

use super::types::ProposalId;
use crate::identity::AccountId;
use crate::store::StoreError;

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Every rejected operation reports exactly one of these.
///
/// A failed write leaves the committed state untouched.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Proposal not found: {0}")]
    NotFound(ProposalId),

    #[error("Proposal is closed: {0}")]
    ProposalClosed(ProposalId),

    #[error("Already voted: {voter} on proposal {proposal_id}")]
    AlreadyVoted {
        proposal_id: ProposalId,
        voter: AccountId,
    },

    #[error("Only creator can close proposal {proposal_id} (caller: {caller})")]
    Unauthorized {
        proposal_id: ProposalId,
        caller: AccountId,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl LedgerError {
    /// Stable name of the error kind, for clients that branch on it.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "ValidationError",
            Self::NotFound(_) => "NotFound",
            Self::ProposalClosed(_) => "ProposalClosed",
            Self::AlreadyVoted { .. } => "AlreadyVoted",
            Self::Unauthorized { .. } => "Unauthorized",
            Self::Storage(_) => "StorageError",
        }
    }
}
