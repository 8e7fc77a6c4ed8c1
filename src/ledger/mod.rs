//! Governance ledger: proposals, one vote per account, creator-only closing.
//!
//! - Proposal ids start at 1 and are never reused
//! - `votes_for + votes_against` always equals the number of vote records
//! - A proposal goes Open → Closed exactly once; Closed is terminal
//! - Rejected operations change nothing

pub mod error;
pub mod governance;
pub mod state;
pub mod types;

#[cfg(test)]
mod proptests;

pub use error::{LedgerError, LedgerResult};
pub use governance::{unix_now, GovernanceLedger};
pub use state::{LedgerDelta, LedgerState};
pub use types::{Outcome, Proposal, ProposalId, ProposalStatus, VoteRecord, FIRST_PROPOSAL_ID};
