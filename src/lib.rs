//! Agora - Minimal Governance Ledger
//!
//! Account holders submit proposals, cast one vote each for or against, and
//! the proposal's creator closes it to freeze the tally.
//!
//! Key principles:
//! - Caller identity is given, never derived (authentication happens outside)
//! - Every write commits fully or not at all
//! - Append-only: nothing is ever deleted
//! - Subscribers are notified after commit, via an explicit event channel

pub mod events;
pub mod history;
pub mod identity;
pub mod ledger;
pub mod rpc;
pub mod serialization;
pub mod store;
