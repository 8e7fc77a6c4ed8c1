//! In-memory store for tests and ephemeral ledgers.

use super::traits::*;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// In-memory journal.
///
/// Clones share the same entries, so a test can keep a handle and inspect
/// what the ledger committed.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Default)]
struct MemoryState {
    entries: Vec<JournalEntry>,
    fail_appends: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing entries (for replay tests).
    pub fn with_entries(entries: Vec<JournalEntry>) -> Self {
        let store = Self::new();
        store.lock().entries = entries;
        store
    }

    /// Make every subsequent `append` fail with `StoreError::Unavailable`.
    pub fn set_fail_appends(&self, fail: bool) {
        self.lock().fail_appends = fail;
    }

    /// Snapshot of committed entries.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test thread panicked mid-append; the
        // Vec itself is still consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn load(&self) -> StoreResult<Vec<JournalEntry>> {
        Ok(self.lock().entries.clone())
    }

    async fn append(&self, entry: &JournalEntry) -> StoreResult<()> {
        let mut state = self.lock();
        if state.fail_appends {
            return Err(StoreError::Unavailable("append disabled".to_string()));
        }
        state.entries.push(entry.clone());
        Ok(())
    }
}
