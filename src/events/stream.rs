//! Broadcast event feed for ledger subscribers.
//!
//! Clients subscribe once and react to each committed transition instead of
//! polling. Works inside `tokio::select!` like any other stream.

use super::{EventPublisher, LedgerEvent, PublishError};
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::broadcast;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tracing::warn;

/// Default number of events buffered per subscriber.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Fan-out publisher. Every subscriber sees every event in commit order.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribe to events committed from now on.
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            inner: BroadcastStream::new(self.sender.subscribe()),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: &LedgerEvent) -> Result<(), PublishError> {
        self.sender
            .send(event.clone())
            .map(|_| ())
            .map_err(|_| PublishError::NoSubscribers)
    }
}

/// Subscriber side of an `EventBus`.
///
/// A subscriber that falls more than the channel capacity behind skips the
/// events it missed (with a warning) and carries on.
pub struct EventStream {
    inner: BroadcastStream<LedgerEvent>,
}

impl Stream for EventStream {
    type Item = LedgerEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match self.inner.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(event))) => return Poll::Ready(Some(event)),
                Poll::Ready(Some(Err(BroadcastStreamRecvError::Lagged(skipped)))) => {
                    warn!(skipped, "event subscriber lagged; events dropped");
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
