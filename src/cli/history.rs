use super::Context;
use agora::history::{self, EntryKind, HistoryQuery};
use agora::identity::AccountId;
use agora::ledger::ProposalId;

/// Print committed history, newest first
pub async fn execute(
    ctx: &Context,
    proposal: Option<u64>,
    actor: Option<AccountId>,
    kind: Option<EntryKind>,
    limit: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger().await?;
    let entries = ledger.journal().await?;

    let query = HistoryQuery {
        proposal: proposal.map(ProposalId),
        actor,
        kind,
        limit: Some(limit),
    };
    let results = history::query(&entries, &query);

    print!("{}", history::format_history(&results));
    if results.is_empty() {
        println!();
    }
    Ok(())
}
