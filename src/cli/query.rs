//! Read-only commands: show, list, count, has-voted.

use super::Context;
use agora::identity::AccountId;
use agora::ledger::{Proposal, ProposalId, ProposalStatus};

/// Multi-line summary of one proposal.
pub fn format_proposal(proposal: &Proposal) -> String {
    let status = match (proposal.status(), proposal.outcome()) {
        (ProposalStatus::Closed, Some(outcome)) => format!("closed ({})", outcome),
        (ProposalStatus::Closed, None) => "closed".to_string(),
        (ProposalStatus::Open, _) => "open".to_string(),
    };

    format!(
        "Proposal {}: {}\n  Creator:     {}\n  Created at:  {}\n  Status:      {}\n  Votes:       {} for, {} against\n  Description: {}",
        proposal.id,
        proposal.title,
        proposal.creator,
        proposal.created_at,
        status,
        proposal.votes_for,
        proposal.votes_against,
        proposal.description,
    )
}

pub async fn show(ctx: &Context, proposal_id: u64) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger().await?;
    let proposal = ledger.get_proposal(ProposalId(proposal_id)).await?;
    println!("{}", format_proposal(&proposal));
    Ok(())
}

pub async fn list(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger().await?;
    let proposals = ledger.list_proposals().await;

    if proposals.is_empty() {
        println!("No proposals.");
        return Ok(());
    }

    for proposal in &proposals {
        println!("{}", format_proposal(proposal));
        println!();
    }
    Ok(())
}

pub async fn count(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger().await?;
    println!("{}", ledger.proposals_count().await);
    Ok(())
}

pub async fn has_voted(
    ctx: &Context,
    proposal_id: u64,
    voter: AccountId,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger().await?;
    println!("{}", ledger.has_voted(ProposalId(proposal_id), &voter).await);
    Ok(())
}
