use super::Context;
use agora::identity::AccountId;
use agora::ledger::unix_now;

/// Submit a new proposal on behalf of `caller`
///
/// Prints the id of the new proposal. Blank titles or descriptions are
/// rejected before anything is written.
pub async fn execute(
    ctx: &Context,
    caller: AccountId,
    title: String,
    description: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let ledger = ctx.open_ledger().await?;
    let id = ledger
        .create_proposal(&caller, &title, &description, unix_now())
        .await?;

    println!("Created proposal {}", id);
    Ok(())
}
