//! Property-based tests for ledger invariants
//!
//! Random operation sequences are run against `LedgerState` and the
//! invariants are checked after every step:
//! - Ids: unique, strictly increasing from 1
//! - Tallies: counters match the number of vote records
//! - One vote per (proposal, voter)
//! - Creator-only close; closed proposals are frozen
//! - Rejected operations leave state untouched

use super::error::LedgerError;
use super::state::LedgerState;
use super::types::{ProposalId, FIRST_PROPOSAL_ID};
use crate::identity::AccountId;
use proptest::prelude::*;

const ACCOUNTS: usize = 5;

#[derive(Debug, Clone)]
enum Op {
    Create { creator: usize },
    Vote { proposal: u64, voter: usize, support: bool },
    Close { proposal: u64, caller: usize },
}

fn account(i: usize) -> AccountId {
    AccountId::parse(&format!("0x{:X}", 0xA + i)).unwrap()
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ACCOUNTS).prop_map(|creator| Op::Create { creator }),
        (0u64..8, 0..ACCOUNTS, any::<bool>())
            .prop_map(|(proposal, voter, support)| Op::Vote { proposal, voter, support }),
        (0u64..8, 0..ACCOUNTS).prop_map(|(proposal, caller)| Op::Close { proposal, caller }),
    ]
}

fn check_tallies(state: &LedgerState) -> Result<(), TestCaseError> {
    for proposal in state.proposals() {
        prop_assert_eq!(
            proposal.total_votes(),
            state.vote_count(proposal.id),
            "tally must equal vote records for proposal {}",
            proposal.id
        );
    }
    Ok(())
}

proptest! {
    /// Property: ids handed out by create are 1, 2, 3, ...
    #[test]
    fn ids_are_sequential(creators in prop::collection::vec(0..ACCOUNTS, 1..30)) {
        let mut state = LedgerState::new();
        for (i, creator) in creators.iter().enumerate() {
            let delta = state.plan_create(&account(*creator), "t", "d", i as u64).unwrap();
            state.apply(&delta).unwrap();
            prop_assert_eq!(delta.proposal_id(), ProposalId(FIRST_PROPOSAL_ID + i as u64));
        }
        let ids: Vec<u64> = state.proposals().map(|p| p.id.0).collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    /// Property: any op sequence keeps every invariant, and rejected ops are no-ops
    #[test]
    fn random_ops_preserve_invariants(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut state = LedgerState::new();

        for op in ops {
            let before = state.clone();
            let planned = match &op {
                Op::Create { creator } => state.plan_create(&account(*creator), "t", "d", 0),
                Op::Vote { proposal, voter, support } => {
                    state.plan_vote(ProposalId(*proposal), &account(*voter), *support)
                }
                Op::Close { proposal, caller } => {
                    state.plan_close(ProposalId(*proposal), &account(*caller))
                }
            };

            match planned {
                Ok(delta) => state.apply(&delta).unwrap(),
                Err(err) => {
                    prop_assert_eq!(&state, &before);
                    match (&op, err) {
                        (Op::Vote { proposal, voter, .. }, LedgerError::AlreadyVoted { .. }) => {
                            prop_assert!(state.has_voted(ProposalId(*proposal), &account(*voter)));
                        }
                        (Op::Close { proposal, caller }, LedgerError::Unauthorized { .. }) => {
                            let p = state.proposal(ProposalId(*proposal)).unwrap();
                            prop_assert!(p.is_open);
                            prop_assert_ne!(&p.creator, &account(*caller));
                        }
                        (_, LedgerError::ProposalClosed(id)) => {
                            prop_assert!(!state.proposal(id).unwrap().is_open);
                        }
                        (_, LedgerError::NotFound(id)) => {
                            prop_assert!(state.proposal(id).is_none());
                        }
                        (op, err) => {
                            prop_assert!(false, "unexpected rejection {:?} for {:?}", err, op);
                        }
                    }
                }
            }

            check_tallies(&state)?;
        }
    }

    /// Property: second vote by the same account always fails, whatever the choice
    #[test]
    fn second_vote_always_rejected(first in any::<bool>(), second in any::<bool>()) {
        let mut state = LedgerState::new();
        let create = state.plan_create(&account(0), "t", "d", 0).unwrap();
        state.apply(&create).unwrap();

        let vote = state.plan_vote(ProposalId(1), &account(1), first).unwrap();
        state.apply(&vote).unwrap();

        let err = state.plan_vote(ProposalId(1), &account(1), second).unwrap_err();
        let is_already_voted = matches!(err, LedgerError::AlreadyVoted { .. });
        prop_assert!(is_already_voted);
        prop_assert_eq!(state.proposal(ProposalId(1)).unwrap().total_votes(), 1);
    }

    /// Property: once closed, votes and closes fail with ProposalClosed
    #[test]
    fn closed_proposals_are_frozen(
        votes in prop::collection::vec((0..ACCOUNTS, any::<bool>()), 0..10),
        late_voter in 0..ACCOUNTS,
        late_closer in 0..ACCOUNTS,
    ) {
        let mut state = LedgerState::new();
        let create = state.plan_create(&account(0), "t", "d", 0).unwrap();
        state.apply(&create).unwrap();

        for (voter, support) in votes {
            if let Ok(delta) = state.plan_vote(ProposalId(1), &account(voter), support) {
                state.apply(&delta).unwrap();
            }
        }

        let close = state.plan_close(ProposalId(1), &account(0)).unwrap();
        state.apply(&close).unwrap();
        let frozen = state.clone();

        let vote_err = state.plan_vote(ProposalId(1), &account(late_voter), true).unwrap_err();
        let close_err = state.plan_close(ProposalId(1), &account(late_closer)).unwrap_err();
        let vote_closed = matches!(vote_err, LedgerError::ProposalClosed(_));
        let close_closed = matches!(close_err, LedgerError::ProposalClosed(_));
        prop_assert!(vote_closed);
        prop_assert!(close_closed);
        prop_assert_eq!(state, frozen);
    }
}
