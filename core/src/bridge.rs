//! Message bridge
//!
//! Adapts the push-style producer side (user prompts, spliced interrupts)
//! into the pull-style protocol the remote call expects: an async sequence
//! that suspends until a value is available and terminates cleanly when
//! told to.
//!
//! Invariants: delivery order is exactly enqueue order; a value is never
//! delivered twice nor dropped while the stream is open; the buffered
//! queue and the waiter queue are never simultaneously non-empty.

use crate::agent::UserMessage;
use futures::Stream;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::oneshot;

struct BridgeState {
    queue: VecDeque<UserMessage>,
    waiters: VecDeque<oneshot::Sender<Option<UserMessage>>>,
    closed: bool,
}

/// Shared handle; clones feed and drain the same turn stream.
#[derive(Clone)]
pub struct MessageBridge {
    state: Arc<Mutex<BridgeState>>,
}

impl Default for MessageBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageBridge {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BridgeState {
                queue: VecDeque::new(),
                waiters: VecDeque::new(),
                closed: false,
            })),
        }
    }

    /// Push an outbound payload. Satisfies the oldest waiter when one is
    /// suspended, otherwise buffers. After `end_stream` this is a no-op.
    pub fn enqueue(&self, message: UserMessage) {
        let mut st = self.state.lock();
        if st.closed {
            return;
        }
        let mut message = message;
        // A waiter whose receiver was dropped must not swallow the value
        while let Some(waiter) = st.waiters.pop_front() {
            match waiter.send(Some(message)) {
                Ok(()) => return,
                Err(Some(back)) => message = back,
                Err(None) => unreachable!("waiter returns the message it was sent"),
            }
        }
        st.queue.push_back(message);
    }

    /// Pull the next outbound payload, suspending while none is buffered.
    /// Returns None once the stream has ended and the buffer is drained.
    pub async fn request_next(&self) -> Option<UserMessage> {
        let rx = {
            let mut st = self.state.lock();
            if let Some(head) = st.queue.pop_front() {
                return Some(head);
            }
            if st.closed {
                return None;
            }
            let (tx, rx) = oneshot::channel();
            st.waiters.push_back(tx);
            rx
        };
        rx.await.unwrap_or(None)
    }

    /// End the stream: every suspended waiter resolves to None and both
    /// internal sequences are cleared. Idempotent; safe with zero waiters.
    pub fn end_stream(&self) {
        let mut st = self.state.lock();
        st.closed = true;
        st.queue.clear();
        for waiter in st.waiters.drain(..) {
            let _ = waiter.send(None);
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// The pull loop as a stream, for handing to the remote call.
    pub fn into_stream(self) -> impl Stream<Item = UserMessage> + Send {
        async_stream::stream! {
            while let Some(message) = self.request_next().await {
                yield message;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn msg(text: &str) -> UserMessage {
        UserMessage::prompt(text)
    }

    #[tokio::test]
    async fn fifo_when_enqueued_before_requests() {
        let bridge = MessageBridge::new();
        bridge.enqueue(msg("x1"));
        bridge.enqueue(msg("x2"));

        assert_eq!(bridge.request_next().await, Some(msg("x1")));
        assert_eq!(bridge.request_next().await, Some(msg("x2")));
    }

    #[tokio::test]
    async fn fifo_when_requests_arrive_first() {
        let bridge = MessageBridge::new();

        let first = bridge.request_next();
        tokio::pin!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());

        let second = bridge.request_next();
        tokio::pin!(second);
        assert!(futures::poll!(second.as_mut()).is_pending());

        bridge.enqueue(msg("x1"));
        bridge.enqueue(msg("x2"));

        assert_eq!(first.await, Some(msg("x1")));
        assert_eq!(second.await, Some(msg("x2")));
    }

    #[tokio::test]
    async fn end_stream_is_idempotent_and_wakes_waiters() {
        let bridge = MessageBridge::new();

        let pending = bridge.request_next();
        tokio::pin!(pending);
        assert!(futures::poll!(pending.as_mut()).is_pending());

        bridge.end_stream();
        bridge.end_stream();
        assert_eq!(pending.await, None);

        // Zero waiters, already closed: still fine
        bridge.end_stream();
        assert_eq!(bridge.request_next().await, None);
    }

    #[tokio::test]
    async fn enqueue_after_end_is_dropped() {
        let bridge = MessageBridge::new();
        bridge.end_stream();
        bridge.enqueue(msg("late"));
        assert_eq!(bridge.request_next().await, None);
    }

    #[tokio::test]
    async fn dropped_waiter_does_not_swallow_a_message() {
        let bridge = MessageBridge::new();

        {
            let doomed = bridge.request_next();
            tokio::pin!(doomed);
            assert!(futures::poll!(doomed.as_mut()).is_pending());
            // receiver dropped here
        }

        bridge.enqueue(msg("survivor"));
        assert_eq!(bridge.request_next().await, Some(msg("survivor")));
    }

    #[tokio::test]
    async fn stream_yields_in_enqueue_order_then_terminates() {
        let bridge = MessageBridge::new();
        bridge.enqueue(msg("a"));
        bridge.enqueue(msg("b"));

        let feeder = bridge.clone();
        let mut stream = Box::pin(bridge.into_stream());

        assert_eq!(stream.next().await, Some(msg("a")));
        assert_eq!(stream.next().await, Some(msg("b")));

        feeder.enqueue(msg("c"));
        assert_eq!(stream.next().await, Some(msg("c")));

        feeder.end_stream();
        assert_eq!(stream.next().await, None);
    }
}
