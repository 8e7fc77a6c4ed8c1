//! JSON-lines request/response protocol for the ledger service.
//!
//! One request per line in, one response per line out. Events committed by
//! the service are interleaved as `{"event": ...}` lines.
//!
//! ```text
//! {"op":"create_proposal","caller":"0xA","title":"Upgrade treasury","description":"Increase reserve ratio"}
//! {"ok":{"proposal_id":1}}
//! {"op":"vote","caller":"0xB","proposal_id":1,"support":true}
//! {"ok":null}
//! {"op":"vote","caller":"0xB","proposal_id":1,"support":false}
//! {"error":{"kind":"AlreadyVoted","message":"Already voted: 0xB on proposal 1"}}
//! ```

use crate::events::{EventPublisher, LedgerEvent};
use crate::identity::AccountId;
use crate::ledger::{unix_now, GovernanceLedger, LedgerError, ProposalId};
use crate::store::LedgerStore;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

/// A client request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    CreateProposal {
        caller: AccountId,
        title: String,
        description: String,
    },
    Vote {
        caller: AccountId,
        proposal_id: ProposalId,
        support: bool,
    },
    CloseProposal {
        caller: AccountId,
        proposal_id: ProposalId,
    },
    GetProposal {
        proposal_id: ProposalId,
    },
    ListProposals,
    HasVoted {
        proposal_id: ProposalId,
        voter: AccountId,
    },
    GetProposalsCount,
}

/// Error payload: a stable `kind` plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

/// Reply to one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Ok(Value),
    Error(ErrorBody),
}

impl Response {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::Error(ErrorBody {
            kind: "BadRequest".to_string(),
            message: message.into(),
        })
    }

    /// A fault on the service side, not in the request.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Error(ErrorBody {
            kind: "InternalError".to_string(),
            message: message.into(),
        })
    }
}

impl From<LedgerError> for Response {
    fn from(err: LedgerError) -> Self {
        Self::Error(ErrorBody {
            kind: err.kind().to_string(),
            message: err.to_string(),
        })
    }
}

/// Outbound line wrapping a committed event.
#[derive(Debug, Serialize)]
struct EventLine<'a> {
    event: &'a LedgerEvent,
}

/// Apply one request to the ledger.
pub async fn handle<S: LedgerStore, P: EventPublisher>(
    ledger: &GovernanceLedger<S, P>,
    request: Request,
) -> Response {
    match request {
        Request::CreateProposal {
            caller,
            title,
            description,
        } => reply(
            ledger
                .create_proposal(&caller, &title, &description, unix_now())
                .await
                .map(|id| json!({ "proposal_id": id })),
        ),
        Request::Vote {
            caller,
            proposal_id,
            support,
        } => reply(ledger.vote(proposal_id, &caller, support).await),
        Request::CloseProposal {
            caller,
            proposal_id,
        } => reply(ledger.close_proposal(proposal_id, &caller).await),
        Request::GetProposal { proposal_id } => reply(ledger.get_proposal(proposal_id).await),
        Request::ListProposals => reply(Ok(ledger.list_proposals().await)),
        Request::HasVoted { proposal_id, voter } => {
            reply(Ok(ledger.has_voted(proposal_id, &voter).await))
        }
        Request::GetProposalsCount => reply(Ok(ledger.proposals_count().await)),
    }
}

/// Parse one request line, apply it, and render the response line.
pub async fn handle_line<S: LedgerStore, P: EventPublisher>(
    ledger: &GovernanceLedger<S, P>,
    line: &str,
) -> String {
    let response = match serde_json::from_str::<Request>(line) {
        Ok(request) => handle(ledger, request).await,
        Err(e) => Response::bad_request(format!("invalid request: {}", e)),
    };
    render(&response)
}

pub fn render(response: &Response) -> String {
    serde_json::to_string(response).unwrap_or_else(|e| {
        warn!(error = %e, "response not renderable");
        r#"{"error":{"kind":"InternalError","message":"response not renderable"}}"#.to_string()
    })
}

/// Render an event line. `None` (logged) if the event can't be encoded.
pub fn render_event(event: &LedgerEvent) -> Option<String> {
    serde_json::to_string(&EventLine { event })
        .map_err(|e| warn!(error = %e, event = ?event, "event not renderable; skipped"))
        .ok()
}

fn reply<T: Serialize>(result: Result<T, LedgerError>) -> Response {
    match result.map(|value| serde_json::to_value(&value)) {
        Ok(Ok(value)) => Response::Ok(value),
        Ok(Err(e)) => {
            warn!(error = %e, "response not serializable");
            Response::internal(format!("response not serializable: {}", e))
        }
        Err(e) => e.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    async fn ledger() -> GovernanceLedger<MemoryStore> {
        GovernanceLedger::open_quiet(MemoryStore::new()).await.unwrap()
    }

    fn error_kind(line: &str) -> String {
        let value: Value = serde_json::from_str(line).unwrap();
        value["error"]["kind"].as_str().unwrap_or_default().to_string()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let ledger = ledger().await;

        let out = handle_line(
            &ledger,
            r#"{"op":"create_proposal","caller":"0xA","title":"Upgrade treasury","description":"Increase reserve ratio"}"#,
        )
        .await;
        assert_eq!(out, r#"{"ok":{"proposal_id":1}}"#);

        let out = handle_line(&ledger, r#"{"op":"get_proposal","proposal_id":1}"#).await;
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["ok"]["title"], "Upgrade treasury");
        assert_eq!(value["ok"]["creator"], "0xA");
        assert_eq!(value["ok"]["is_open"], true);
    }

    #[tokio::test]
    async fn test_error_kinds_reported() {
        let ledger = ledger().await;
        handle_line(
            &ledger,
            r#"{"op":"create_proposal","caller":"0xA","title":"t","description":"d"}"#,
        )
        .await;

        let vote = r#"{"op":"vote","caller":"0xB","proposal_id":1,"support":true}"#;
        assert_eq!(handle_line(&ledger, vote).await, r#"{"ok":null}"#);
        assert_eq!(error_kind(&handle_line(&ledger, vote).await), "AlreadyVoted");

        let close = r#"{"op":"close_proposal","caller":"0xC","proposal_id":1}"#;
        assert_eq!(error_kind(&handle_line(&ledger, close).await), "Unauthorized");

        let missing = r#"{"op":"get_proposal","proposal_id":9}"#;
        assert_eq!(error_kind(&handle_line(&ledger, missing).await), "NotFound");

        let empty = r#"{"op":"create_proposal","caller":"0xA","title":"","description":"d"}"#;
        assert_eq!(error_kind(&handle_line(&ledger, empty).await), "ValidationError");
    }

    #[tokio::test]
    async fn test_bad_requests() {
        let ledger = ledger().await;
        assert_eq!(error_kind(&handle_line(&ledger, "not json").await), "BadRequest");
        assert_eq!(
            error_kind(&handle_line(&ledger, r#"{"op":"explode"}"#).await),
            "BadRequest"
        );
        // Blank caller identities never reach the ledger.
        let blank = r#"{"op":"vote","caller":" ","proposal_id":1,"support":true}"#;
        assert_eq!(error_kind(&handle_line(&ledger, blank).await), "BadRequest");
    }

    #[tokio::test]
    async fn test_reads() {
        let ledger = ledger().await;
        assert_eq!(
            handle_line(&ledger, r#"{"op":"get_proposals_count"}"#).await,
            r#"{"ok":0}"#
        );
        assert_eq!(
            handle_line(&ledger, r#"{"op":"list_proposals"}"#).await,
            r#"{"ok":[]}"#
        );
        assert_eq!(
            handle_line(&ledger, r#"{"op":"has_voted","proposal_id":1,"voter":"0xB"}"#).await,
            r#"{"ok":false}"#
        );
    }

    #[test]
    fn test_render_event() {
        let event = LedgerEvent::Voted {
            proposal_id: ProposalId(1),
            voter: AccountId::parse("0xB").unwrap(),
            support: false,
        };
        assert_eq!(
            render_event(&event).as_deref(),
            Some(r#"{"event":{"type":"Voted","proposal_id":1,"voter":"0xB","support":false}}"#)
        );
    }

    struct Unencodable;

    impl Serialize for Unencodable {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("no JSON form"))
        }
    }

    #[test]
    fn test_unserializable_reply_is_internal_error() {
        let response = reply(Ok::<_, LedgerError>(Unencodable));
        match response {
            Response::Error(body) => {
                assert_eq!(body.kind, "InternalError");
                assert!(body.message.contains("no JSON form"));
            }
            Response::Ok(_) => panic!("Expected an error response"),
        }
    }

    #[test]
    fn test_ledger_errors_keep_their_kind() {
        let response = reply::<()>(Err(LedgerError::NotFound(ProposalId(4))));
        assert_eq!(
            render(&response),
            r#"{"error":{"kind":"NotFound","message":"Proposal not found: 4"}}"#
        );
    }
}
