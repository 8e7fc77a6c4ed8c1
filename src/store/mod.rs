//! Durable ordered storage for the governance ledger.
//!
//! - `LedgerStore`: async trait the ledger is generic over
//! - `FileJournal`: append-only file, fsync'd per commit
//! - `MemoryStore`: in-process store for tests

pub mod journal;
pub mod memory;
pub mod traits;

pub use journal::FileJournal;
pub use memory::MemoryStore;
pub use traits::{JournalEntry, LedgerStore, StoreError, StoreResult};
