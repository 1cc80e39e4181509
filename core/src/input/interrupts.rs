//! Interrupt queue
//!
//! Text captured while a turn is streaming lands here instead of the
//! prompt waiter. Consumption is strictly FIFO. A registered callback
//! fires on every capture *in addition to* the enqueue — at-least-once:
//! the orchestrator polls `pop_next` as the source of truth, so a capture
//! is never lost when the callback path races with consumption.

use std::collections::VecDeque;

pub type InterruptCallback = Box<dyn Fn(&str) + Send + Sync>;

#[derive(Default)]
pub struct InterruptQueue {
    pending: VecDeque<String>,
    callback: Option<InterruptCallback>,
}

impl InterruptQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_callback(&mut self, callback: impl Fn(&str) + Send + Sync + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Enqueue captured text and fire the callback with the same text.
    pub fn capture(&mut self, text: String) {
        self.pending.push_back(text.clone());
        if let Some(callback) = &self.callback {
            callback(&text);
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Remove and return the oldest entry, if any. Non-blocking.
    pub fn pop_next(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    pub fn drain(&mut self) -> Vec<String> {
        self.pending.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn fifo_order_is_preserved() {
        let mut queue = InterruptQueue::new();
        queue.capture("A".to_string());
        queue.capture("B".to_string());
        queue.capture("C".to_string());

        assert_eq!(queue.pop_next().as_deref(), Some("A"));
        assert_eq!(queue.pop_next().as_deref(), Some("B"));
        assert_eq!(queue.pop_next().as_deref(), Some("C"));
        assert_eq!(queue.pop_next(), None);
    }

    #[test]
    fn callback_fires_on_every_capture_and_queue_still_holds_data() {
        let hits = Arc::new(AtomicUsize::new(0));
        let seen = hits.clone();

        let mut queue = InterruptQueue::new();
        queue.set_callback(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        queue.capture("one".to_string());
        queue.capture("two".to_string());

        assert_eq!(hits.load(Ordering::SeqCst), 2);
        // Callback did not consume anything
        assert!(queue.has_pending());
        assert_eq!(queue.drain(), vec!["one".to_string(), "two".to_string()]);
        assert!(!queue.has_pending());
    }

    #[test]
    fn capture_without_callback_is_safe() {
        let mut queue = InterruptQueue::new();
        queue.capture("quiet".to_string());
        assert_eq!(queue.pop_next().as_deref(), Some("quiet"));
    }
}
