//! The governance ledger service.
//!
//! Write path for every operation, under one write lock:
//! 1. Plan the delta against committed state (all preconditions)
//! 2. Append it to the store (durable)
//! 3. Apply it to in-memory state
//! 4. Publish the matching event
//!
//! Holding the lock across all four steps makes writes totally ordered and
//! keeps readers from ever seeing a half-applied transition. A failure in
//! steps 1 or 2 leaves everything as it was.

use super::error::{LedgerError, LedgerResult};
use super::state::{LedgerDelta, LedgerState};
use super::types::{Proposal, ProposalId, VoteRecord};
use crate::events::{EventPublisher, LedgerEvent, NoopPublisher, PublishError};
use crate::identity::AccountId;
use crate::store::{JournalEntry, LedgerStore, StoreError};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Proposal/vote state machine backed by a `LedgerStore`.
pub struct GovernanceLedger<S: LedgerStore, P: EventPublisher = NoopPublisher> {
    store: S,
    publisher: P,
    inner: RwLock<Committed>,
}

struct Committed {
    state: LedgerState,
    last_sequence: u64,
}

impl<S: LedgerStore> GovernanceLedger<S, NoopPublisher> {
    /// Open a ledger that doesn't publish events.
    pub async fn open_quiet(store: S) -> LedgerResult<Self> {
        Self::open(store, NoopPublisher).await
    }
}

impl<S: LedgerStore, P: EventPublisher> GovernanceLedger<S, P> {
    /// Rebuild committed state from the store's journal.
    ///
    /// Historical events are not re-published.
    pub async fn open(store: S, publisher: P) -> LedgerResult<Self> {
        let entries = store.load().await?;
        let mut state = LedgerState::new();
        let mut last_sequence = 0;

        for entry in &entries {
            if entry.sequence != last_sequence + 1 {
                return Err(StoreError::Corrupt(format!(
                    "journal sequence jumps from {} to {}",
                    last_sequence, entry.sequence
                ))
                .into());
            }
            state.apply(&entry.delta).map_err(|e| {
                StoreError::Corrupt(format!("entry {} does not apply: {}", entry.sequence, e))
            })?;
            last_sequence = entry.sequence;
        }

        info!(
            entries = entries.len(),
            proposals = state.proposals_count(),
            "governance ledger opened"
        );

        Ok(Self {
            store,
            publisher,
            inner: RwLock::new(Committed {
                state,
                last_sequence,
            }),
        })
    }

    /// Create a proposal. `now` is the creation timestamp (Unix seconds).
    pub async fn create_proposal(
        &self,
        creator: &AccountId,
        title: &str,
        description: &str,
        now: u64,
    ) -> LedgerResult<ProposalId> {
        let mut inner = self.inner.write().await;
        let delta = inner
            .state
            .plan_create(creator, title, description, now)
            .map_err(|e| rejected("create_proposal", e))?;
        let id = delta.proposal_id();

        self.commit(&mut inner, delta).await?;
        info!(proposal_id = %id, creator = %creator, "proposal created");
        Ok(id)
    }

    /// Cast `voter`'s single vote on a proposal.
    pub async fn vote(
        &self,
        proposal_id: ProposalId,
        voter: &AccountId,
        support: bool,
    ) -> LedgerResult<()> {
        let mut inner = self.inner.write().await;
        let delta = inner
            .state
            .plan_vote(proposal_id, voter, support)
            .map_err(|e| rejected("vote", e))?;

        self.commit(&mut inner, delta).await?;
        info!(proposal_id = %proposal_id, voter = %voter, support, "vote cast");
        Ok(())
    }

    /// Close a proposal. Only its creator may do this, and only once.
    ///
    /// Returns the proposal with its final counts.
    pub async fn close_proposal(
        &self,
        proposal_id: ProposalId,
        caller: &AccountId,
    ) -> LedgerResult<Proposal> {
        let mut inner = self.inner.write().await;
        let delta = inner
            .state
            .plan_close(proposal_id, caller)
            .map_err(|e| rejected("close_proposal", e))?;

        self.commit(&mut inner, delta).await?;
        let proposal = inner
            .state
            .proposal(proposal_id)
            .cloned()
            .ok_or(LedgerError::NotFound(proposal_id))?;

        info!(
            proposal_id = %proposal_id,
            votes_for = proposal.votes_for,
            votes_against = proposal.votes_against,
            "proposal closed"
        );
        Ok(proposal)
    }

    pub async fn get_proposal(&self, proposal_id: ProposalId) -> LedgerResult<Proposal> {
        let inner = self.inner.read().await;
        inner
            .state
            .proposal(proposal_id)
            .cloned()
            .ok_or(LedgerError::NotFound(proposal_id))
    }

    /// All proposals, ascending by id.
    pub async fn list_proposals(&self) -> Vec<Proposal> {
        let inner = self.inner.read().await;
        inner.state.proposals().cloned().collect()
    }

    pub async fn proposals_count(&self) -> u64 {
        self.inner.read().await.state.proposals_count()
    }

    /// Whether `voter` has voted on the proposal. Does not reveal the choice.
    pub async fn has_voted(&self, proposal_id: ProposalId, voter: &AccountId) -> bool {
        self.inner.read().await.state.has_voted(proposal_id, voter)
    }

    /// Audit read of a stored vote, including the choice cast.
    pub async fn vote_record(
        &self,
        proposal_id: ProposalId,
        voter: &AccountId,
    ) -> Option<VoteRecord> {
        let inner = self.inner.read().await;
        inner.state.vote_record(proposal_id, voter).cloned()
    }

    /// Every committed journal entry, oldest first.
    pub async fn journal(&self) -> LedgerResult<Vec<JournalEntry>> {
        // Read lock keeps the journal consistent with committed state.
        let _inner = self.inner.read().await;
        Ok(self.store.load().await?)
    }

    async fn commit(&self, inner: &mut Committed, delta: LedgerDelta) -> LedgerResult<()> {
        let entry = JournalEntry {
            sequence: inner.last_sequence + 1,
            recorded_at: unix_now(),
            delta,
        };

        if let Err(e) = self.store.append(&entry).await {
            warn!(error = %e, sequence = entry.sequence, "journal append failed; nothing committed");
            return Err(e.into());
        }

        inner.state.apply(&entry.delta)?;
        inner.last_sequence = entry.sequence;

        let event = event_for(&inner.state, &entry.delta);
        match self.publisher.publish(&event) {
            Ok(()) => debug!(sequence = entry.sequence, "event published"),
            Err(PublishError::NoSubscribers) => {
                debug!(sequence = entry.sequence, "event dropped: no subscribers")
            }
            Err(e) => warn!(error = %e, sequence = entry.sequence, "event delivery failed"),
        }

        Ok(())
    }
}

fn event_for(state: &LedgerState, delta: &LedgerDelta) -> LedgerEvent {
    match delta {
        LedgerDelta::ProposalCreated { proposal } => LedgerEvent::ProposalCreated {
            id: proposal.id,
            title: proposal.title.clone(),
            creator: proposal.creator.clone(),
        },
        LedgerDelta::VoteCast { record } => LedgerEvent::Voted {
            proposal_id: record.proposal_id,
            voter: record.voter.clone(),
            support: record.support,
        },
        LedgerDelta::ProposalClosed { proposal_id, .. } => {
            let (votes_for, votes_against) = state
                .proposal(*proposal_id)
                .map(|p| (p.votes_for, p.votes_against))
                .unwrap_or_default();
            LedgerEvent::ProposalClosed {
                id: *proposal_id,
                votes_for,
                votes_against,
            }
        }
    }
}

fn rejected(operation: &'static str, error: LedgerError) -> LedgerError {
    match error {
        LedgerError::Unauthorized { .. } => {
            warn!(operation, kind = error.kind(), error = %error, "operation rejected")
        }
        _ => debug!(operation, kind = error.kind(), error = %error, "operation rejected"),
    }
    error
}

/// Current Unix time in seconds (0 if the clock is before the epoch).
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
