//! Outbound notifications for committed transitions.
//!
//! The ledger hands each event to an `EventPublisher` after the transition
//! has been committed. Delivery problems are logged and otherwise ignored;
//! they never undo a commit.

pub mod stream;

pub use stream::{EventBus, EventStream};

use crate::identity::AccountId;
use crate::ledger::ProposalId;
use serde::{Deserialize, Serialize};

/// Notification emitted after a committed transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LedgerEvent {
    ProposalCreated {
        id: ProposalId,
        title: String,
        creator: AccountId,
    },
    Voted {
        proposal_id: ProposalId,
        voter: AccountId,
        support: bool,
    },
    ProposalClosed {
        id: ProposalId,
        votes_for: u64,
        votes_against: u64,
    },
}

impl LedgerEvent {
    pub fn proposal_id(&self) -> ProposalId {
        match self {
            Self::ProposalCreated { id, .. } | Self::ProposalClosed { id, .. } => *id,
            Self::Voted { proposal_id, .. } => *proposal_id,
        }
    }
}

/// Event publication errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("No active subscribers")]
    NoSubscribers,

    #[error("Publish failed: {0}")]
    Other(String),
}

/// Sink for ledger events.
///
/// Called while the ledger still holds its write lock, so implementations
/// must not block.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: &LedgerEvent) -> Result<(), PublishError>;
}

/// Publisher that drops every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl EventPublisher for NoopPublisher {
    fn publish(&self, _event: &LedgerEvent) -> Result<(), PublishError> {
        Ok(())
    }
}

impl<P: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<P> {
    fn publish(&self, event: &LedgerEvent) -> Result<(), PublishError> {
        (**self).publish(event)
    }
}
