//! Ledger history (audit trail)
//!
//! The journal is already an immutable, append-only record of every
//! committed transition. This module filters and formats it:
//! - Filter by proposal, by actor (creator, voter or closer), by kind
//! - Newest first, bounded by a limit

use crate::identity::AccountId;
use crate::ledger::{LedgerDelta, ProposalId};
use crate::store::JournalEntry;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;

/// Kind of committed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Created,
    Voted,
    Closed,
}

impl EntryKind {
    pub fn of(delta: &LedgerDelta) -> Self {
        match delta {
            LedgerDelta::ProposalCreated { .. } => Self::Created,
            LedgerDelta::VoteCast { .. } => Self::Voted,
            LedgerDelta::ProposalClosed { .. } => Self::Closed,
        }
    }
}

impl std::str::FromStr for EntryKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "voted" => Ok(Self::Voted),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown entry kind '{}'", other)),
        }
    }
}

/// Query options for the history.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    pub proposal: Option<ProposalId>,
    pub actor: Option<AccountId>,
    pub kind: Option<EntryKind>,
    /// Limit number of results (most recent first).
    pub limit: Option<usize>,
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self {
            proposal: None,
            actor: None,
            kind: None,
            limit: Some(50),
        }
    }
}

/// Query journal entries with filters.
///
/// Returns entries in reverse commit order (most recent first).
pub fn query(entries: &[JournalEntry], query: &HistoryQuery) -> Vec<JournalEntry> {
    let mut filtered: Vec<JournalEntry> = entries
        .iter()
        .filter(|entry| {
            if let Some(proposal) = query.proposal {
                if entry.delta.proposal_id() != proposal {
                    return false;
                }
            }

            if let Some(ref actor) = query.actor {
                if entry.delta.actor() != actor {
                    return false;
                }
            }

            if let Some(kind) = query.kind {
                if EntryKind::of(&entry.delta) != kind {
                    return false;
                }
            }

            true
        })
        .cloned()
        .collect();

    filtered.sort_by(|a, b| b.sequence.cmp(&a.sequence));

    if let Some(limit) = query.limit {
        filtered.truncate(limit);
    }

    filtered
}

/// One line per entry, for terminal output.
pub fn format_history(entries: &[JournalEntry]) -> String {
    if entries.is_empty() {
        return "No history entries found.".to_string();
    }

    let mut output = String::new();
    for entry in entries {
        let _ = write!(output, "#{:<5} @{} ", entry.sequence, entry.recorded_at);
        let _ = match &entry.delta {
            LedgerDelta::ProposalCreated { proposal } => writeln!(
                output,
                "proposal {} created by {}: {}",
                proposal.id, proposal.creator, proposal.title
            ),
            LedgerDelta::VoteCast { record } => writeln!(
                output,
                "{} voted {} on proposal {}",
                record.voter,
                if record.support { "for" } else { "against" },
                record.proposal_id
            ),
            LedgerDelta::ProposalClosed {
                proposal_id,
                closed_by,
            } => writeln!(output, "proposal {} closed by {}", proposal_id, closed_by),
        };
    }
    output
}
