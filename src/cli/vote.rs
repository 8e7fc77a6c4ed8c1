use super::{Choice, Context};
use agora::identity::AccountId;
use agora::ledger::ProposalId;

/// Cast `caller`'s vote on a proposal
pub async fn execute(
    ctx: &Context,
    proposal_id: u64,
    caller: AccountId,
    choice: Choice,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger().await?;
    let id = ProposalId(proposal_id);
    ledger.vote(id, &caller, choice.support()).await?;

    let proposal = ledger.get_proposal(id).await?;
    println!(
        "Vote recorded on proposal {} (for: {}, against: {})",
        id, proposal.votes_for, proposal.votes_against
    );
    Ok(())
}
