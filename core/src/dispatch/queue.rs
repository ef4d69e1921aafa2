//! Queue of deferred events awaiting re-delivery.
//!
//! Entries are keyed by `Event::key`: deferring an event whose key is
//! already pending replaces the older copy, so at most one instance of each
//! event kind (per relation) waits at any time. Due entries come out in
//! the order they were deferred.

use crate::types::event::Event;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Pending {
    key: String,
    event: Event,
    due_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct DeferQueue {
    pending: Vec<Pending>,
}

impl DeferQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `event` for re-delivery at or after `due_ms`, replacing any
    /// pending event with the same key.
    pub fn defer(&mut self, event: Event, due_ms: u64) {
        let key = event.key();
        self.pending.retain(|p| p.key != key);
        self.pending.push(Pending { key, event, due_ms });
    }

    /// Drop the pending event with this key. Returns whether one was pending.
    pub fn cancel(&mut self, key: &str) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.key != key);
        self.pending.len() != before
    }

    /// Remove and return every event due at `now_ms`.
    pub fn take_due(&mut self, now_ms: u64) -> Vec<Event> {
        let (due, waiting): (Vec<Pending>, Vec<Pending>) =
            self.pending.drain(..).partition(|p| p.due_ms <= now_ms);
        self.pending = waiting;
        due.into_iter().map(|p| p.event).collect()
    }

    /// Earliest due time among pending events.
    pub fn next_due_ms(&self) -> Option<u64> {
        self.pending.iter().map(|p| p.due_ms).min()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pending.iter().any(|p| p.key == key)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
