//! Proposal and vote records.

use crate::identity::AccountId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Id handed to the first proposal ever created.
pub const FIRST_PROPOSAL_ID: u64 = 1;

/// Proposal identifier. Allocated sequentially, never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProposalId(pub u64);

impl ProposalId {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProposalId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// Open/closed lifecycle of a proposal. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    Open,
    Closed,
}

/// Final result of a closed proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Passed,
    Rejected,
    Tied,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Rejected => write!(f, "rejected"),
            Self::Tied => write!(f, "tied"),
        }
    }
}

/// A governance proposal.
///
/// Everything except the two counters and `is_open` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proposal {
    pub id: ProposalId,
    pub title: String,
    pub description: String,
    pub creator: AccountId,
    /// Unix timestamp (seconds) supplied by the caller's environment.
    pub created_at: u64,
    pub votes_for: u64,
    pub votes_against: u64,
    pub is_open: bool,
}

impl Proposal {
    pub fn status(&self) -> ProposalStatus {
        if self.is_open {
            ProposalStatus::Open
        } else {
            ProposalStatus::Closed
        }
    }

    pub fn total_votes(&self) -> u64 {
        self.votes_for + self.votes_against
    }

    /// Final outcome, or `None` while voting is still open.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.is_open {
            return None;
        }
        Some(match self.votes_for.cmp(&self.votes_against) {
            std::cmp::Ordering::Greater => Outcome::Passed,
            std::cmp::Ordering::Less => Outcome::Rejected,
            std::cmp::Ordering::Equal => Outcome::Tied,
        })
    }
}

/// One account's vote on one proposal. Written once, never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub proposal_id: ProposalId,
    pub voter: AccountId,
    pub support: bool,
}
