//! Committed ledger state and the transitions that move it forward.
//!
//! `LedgerState` only changes through `apply`, one `LedgerDelta` at a time.
//! The `plan_*` methods run every precondition against the current state and
//! produce the delta without touching anything, so a rejected operation has
//! no effect at all.

use super::error::{LedgerError, LedgerResult};
use super::types::{Proposal, ProposalId, VoteRecord, FIRST_PROPOSAL_ID};
use crate::identity::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One committed transition. This is what the journal stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LedgerDelta {
    ProposalCreated { proposal: Proposal },
    VoteCast { record: VoteRecord },
    ProposalClosed {
        proposal_id: ProposalId,
        closed_by: AccountId,
    },
}

impl LedgerDelta {
    pub fn proposal_id(&self) -> ProposalId {
        match self {
            Self::ProposalCreated { proposal } => proposal.id,
            Self::VoteCast { record } => record.proposal_id,
            Self::ProposalClosed { proposal_id, .. } => *proposal_id,
        }
    }

    /// Account that caused the transition.
    pub fn actor(&self) -> &AccountId {
        match self {
            Self::ProposalCreated { proposal } => &proposal.creator,
            Self::VoteCast { record } => &record.voter,
            Self::ProposalClosed { closed_by, .. } => closed_by,
        }
    }
}

/// All proposals and vote records, plus the id counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    proposals: BTreeMap<ProposalId, Proposal>,
    votes: HashMap<(ProposalId, AccountId), VoteRecord>,
    next_id: ProposalId,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    pub fn new() -> Self {
        Self {
            proposals: BTreeMap::new(),
            votes: HashMap::new(),
            next_id: ProposalId(FIRST_PROPOSAL_ID),
        }
    }

    pub fn next_id(&self) -> ProposalId {
        self.next_id
    }

    pub fn proposal(&self, id: ProposalId) -> Option<&Proposal> {
        self.proposals.get(&id)
    }

    /// Proposals in ascending id order.
    pub fn proposals(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn proposals_count(&self) -> u64 {
        self.proposals.len() as u64
    }

    pub fn vote_record(&self, id: ProposalId, voter: &AccountId) -> Option<&VoteRecord> {
        self.votes.get(&(id, voter.clone()))
    }

    pub fn has_voted(&self, id: ProposalId, voter: &AccountId) -> bool {
        self.votes.contains_key(&(id, voter.clone()))
    }

    /// Number of vote records stored for a proposal.
    pub fn vote_count(&self, id: ProposalId) -> u64 {
        self.votes.keys().filter(|(pid, _)| *pid == id).count() as u64
    }

    pub fn plan_create(
        &self,
        creator: &AccountId,
        title: &str,
        description: &str,
        now: u64,
    ) -> LedgerResult<LedgerDelta> {
        if title.trim().is_empty() {
            return Err(LedgerError::Validation("title must not be empty".to_string()));
        }
        if description.trim().is_empty() {
            return Err(LedgerError::Validation(
                "description must not be empty".to_string(),
            ));
        }

        Ok(LedgerDelta::ProposalCreated {
            proposal: Proposal {
                id: self.next_id,
                title: title.to_string(),
                description: description.to_string(),
                creator: creator.clone(),
                created_at: now,
                votes_for: 0,
                votes_against: 0,
                is_open: true,
            },
        })
    }

    /// Checks run in order: existence, open state, duplicate vote.
    pub fn plan_vote(
        &self,
        id: ProposalId,
        voter: &AccountId,
        support: bool,
    ) -> LedgerResult<LedgerDelta> {
        let proposal = self.proposals.get(&id).ok_or(LedgerError::NotFound(id))?;
        if !proposal.is_open {
            return Err(LedgerError::ProposalClosed(id));
        }
        if self.has_voted(id, voter) {
            return Err(LedgerError::AlreadyVoted {
                proposal_id: id,
                voter: voter.clone(),
            });
        }

        Ok(LedgerDelta::VoteCast {
            record: VoteRecord {
                proposal_id: id,
                voter: voter.clone(),
                support,
            },
        })
    }

    /// Checks run in order: existence, already closed, creator-only.
    pub fn plan_close(&self, id: ProposalId, caller: &AccountId) -> LedgerResult<LedgerDelta> {
        let proposal = self.proposals.get(&id).ok_or(LedgerError::NotFound(id))?;
        if !proposal.is_open {
            return Err(LedgerError::ProposalClosed(id));
        }
        if &proposal.creator != caller {
            return Err(LedgerError::Unauthorized {
                proposal_id: id,
                caller: caller.clone(),
            });
        }

        Ok(LedgerDelta::ProposalClosed {
            proposal_id: id,
            closed_by: caller.clone(),
        })
    }

    /// Apply a delta, re-checking its preconditions first.
    ///
    /// Planned deltas always pass. Replayed journal entries may not, in which
    /// case the state is left as it was.
    pub fn apply(&mut self, delta: &LedgerDelta) -> LedgerResult<()> {
        match delta {
            LedgerDelta::ProposalCreated { proposal } => {
                if proposal.id != self.next_id {
                    return Err(LedgerError::Validation(format!(
                        "proposal id {} out of sequence (expected {})",
                        proposal.id, self.next_id
                    )));
                }
                if !proposal.is_open || proposal.total_votes() != 0 {
                    return Err(LedgerError::Validation(format!(
                        "proposal {} must start open with no votes",
                        proposal.id
                    )));
                }
                self.plan_create(
                    &proposal.creator,
                    &proposal.title,
                    &proposal.description,
                    proposal.created_at,
                )?;
                self.proposals.insert(proposal.id, proposal.clone());
                self.next_id = proposal.id.next();
            }
            LedgerDelta::VoteCast { record } => {
                self.plan_vote(record.proposal_id, &record.voter, record.support)?;
                if let Some(proposal) = self.proposals.get_mut(&record.proposal_id) {
                    if record.support {
                        proposal.votes_for += 1;
                    } else {
                        proposal.votes_against += 1;
                    }
                }
                self.votes.insert(
                    (record.proposal_id, record.voter.clone()),
                    record.clone(),
                );
            }
            LedgerDelta::ProposalClosed {
                proposal_id,
                closed_by,
            } => {
                self.plan_close(*proposal_id, closed_by)?;
                if let Some(proposal) = self.proposals.get_mut(proposal_id) {
                    proposal.is_open = false;
                }
            }
        }
        Ok(())
    }
}
