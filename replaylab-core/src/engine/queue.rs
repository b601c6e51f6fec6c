//! FIFO event queue: the causal backbone of the dispatch loop.
//!
//! Handlers enqueue the consequences of an event while the queue is being
//! drained. Strict FIFO order therefore resolves every consequence of one
//! market bar before the next bar is introduced. No priority, no dedup.

use crate::domain::Event;
use std::collections::VecDeque;

/// Single-threaded FIFO buffer of events.
///
/// Access goes through `&mut self`; sharing it between threads requires
/// external synchronization.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<Event>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event to the tail.
    pub fn put(&mut self, event: impl Into<Event>) {
        let event = event.into();
        tracing::trace!(kind = %event.kind(), symbol = event.symbol(), ts = %event.ts(), "put");
        self.events.push_back(event);
    }

    /// Remove and return the head, or `None` when the queue is empty.
    pub fn get(&mut self) -> Option<Event> {
        self.events.pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Discard everything still pending. Returns how many events were dropped.
    pub fn clear(&mut self) -> usize {
        let dropped = self.events.len();
        self.events.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EventKind, MarketEvent, Side, SignalEvent};
    use chrono::{TimeZone, Utc};

    fn market(close: f64) -> MarketEvent {
        let ts = Utc.with_ymd_and_hms(2026, 1, 2, 9, 30, 0).unwrap();
        MarketEvent::new(ts, "SPY", close, close, close, close, 0.0).unwrap()
    }

    #[test]
    fn empty_queue_returns_none() {
        let mut q = EventQueue::new();
        assert!(q.is_empty());
        assert!(q.get().is_none());
    }

    #[test]
    fn fifo_order() {
        let mut q = EventQueue::new();
        q.put(market(1.0));
        q.put(market(2.0));
        q.put(market(3.0));
        assert_eq!(q.len(), 3);

        let closes: Vec<f64> = std::iter::from_fn(|| q.get())
            .map(|e| match e {
                Event::Market(m) => m.close(),
                other => panic!("unexpected {:?}", other.kind()),
            })
            .collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert!(q.is_empty());
    }

    #[test]
    fn events_put_while_draining_go_to_the_tail() {
        let mut q = EventQueue::new();
        q.put(market(1.0));
        q.put(market(2.0));

        let first = q.get().unwrap();
        let signal = SignalEvent::new(first.ts(), "SPY", Side::Buy, None).unwrap();
        q.put(signal);

        assert_eq!(q.get().unwrap().kind(), EventKind::Market);
        assert_eq!(q.get().unwrap().kind(), EventKind::Signal);
        assert!(q.get().is_none());
    }

    #[test]
    fn no_deduplication() {
        let mut q = EventQueue::new();
        q.put(market(1.0));
        q.put(market(1.0));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn clear_reports_dropped_count() {
        let mut q = EventQueue::new();
        q.put(market(1.0));
        q.put(market(2.0));
        assert_eq!(q.clear(), 2);
        assert!(q.is_empty());
    }
}
