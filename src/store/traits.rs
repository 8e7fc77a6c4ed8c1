//! Trait abstraction for ledger persistence.
//!
//! The ledger keeps its working state in memory and treats the store as an
//! ordered, append-only journal of committed deltas. Replaying the journal
//! from the start rebuilds the exact committed state.

use crate::ledger::LedgerDelta;
use crate::serialization::SerializationError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One committed transition as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Position in the journal, starting at 1 with no gaps.
    pub sequence: u64,
    /// Unix timestamp (seconds) at which the transition was committed.
    pub recorded_at: u64,
    pub delta: LedgerDelta,
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] SerializationError),

    #[error("Corrupt journal: {0}")]
    Corrupt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Durable, ordered storage for journal entries.
///
/// `append` must not return `Ok` until the entry would survive a restart.
/// Implementations may assume appends are never issued concurrently; the
/// ledger serializes them.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Load every committed entry, in append order.
    async fn load(&self) -> StoreResult<Vec<JournalEntry>>;

    /// Durably append one entry.
    async fn append(&self, entry: &JournalEntry) -> StoreResult<()>;
}
