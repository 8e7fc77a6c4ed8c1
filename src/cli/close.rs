use super::Context;
use agora::identity::AccountId;
use agora::ledger::ProposalId;

/// Close a proposal and print its final tally
pub async fn execute(
    ctx: &Context,
    proposal_id: u64,
    caller: AccountId,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger().await?;
    let proposal = ledger.close_proposal(ProposalId(proposal_id), &caller).await?;

    let outcome = proposal
        .outcome()
        .map(|o| o.to_string())
        .unwrap_or_else(|| "open".to_string());
    println!(
        "Closed proposal {}: {} (for: {}, against: {})",
        proposal.id, outcome, proposal.votes_for, proposal.votes_against
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{propose, test_context};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_only_creator_can_close() {
        let temp_dir = TempDir::new().unwrap();
        let ctx = test_context(temp_dir.path());
        let creator = AccountId::parse("0xA").unwrap();

        propose::execute(&ctx, creator.clone(), "t".into(), "d".into())
            .await
            .unwrap();

        let err = execute(&ctx, 1, AccountId::parse("0xC").unwrap())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Only creator can close proposal"));

        execute(&ctx, 1, creator.clone()).await.unwrap();
        let err = execute(&ctx, 1, creator).await.unwrap_err();
        assert!(err.to_string().contains("Proposal is closed"));

        let ledger = ctx.open_ledger().await.unwrap();
        assert!(!ledger.get_proposal(ProposalId(1)).await.unwrap().is_open);
    }
}
