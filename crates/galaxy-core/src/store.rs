//! In-memory store of active events plus a bounded creation history.
//!
//! Expiry is explicit: [`EventStore::cleanup_expired`] is the only way an
//! event leaves the active list. Reads never prune, so what a caller sees
//! is exactly what the last cleanup pass left behind plus anything
//! appended since.

use std::collections::VecDeque;

use galaxy_types::ActiveEvent;

/// Default number of events kept in the creation history.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Authoritative list of active events.
#[derive(Debug, Clone)]
pub struct EventStore {
    active: Vec<ActiveEvent>,
    history: VecDeque<ActiveEvent>,
    history_limit: usize,
}

impl EventStore {
    /// Create an empty store keeping at most `history_limit` past events.
    ///
    /// A limit of zero is raised to one.
    pub fn new(history_limit: usize) -> Self {
        let history_limit = history_limit.max(1);
        Self {
            active: Vec::new(),
            history: VecDeque::with_capacity(history_limit),
            history_limit,
        }
    }

    /// Add `event` to the active list and the history.
    ///
    /// Several events of the same type may be active at once. When the
    /// history is full its oldest entry is dropped.
    pub fn append(&mut self, event: ActiveEvent) {
        if self.history.len() >= self.history_limit {
            self.history.pop_front();
        }
        self.history.push_back(event.clone());
        self.active.push(event);
    }

    /// Remove every event whose `end_time <= now`.
    ///
    /// Remaining events keep their relative order. Returns the number of
    /// events removed; repeating the call with the same `now` removes
    /// nothing.
    pub fn cleanup_expired(&mut self, now: i64) -> usize {
        let before = self.active.len();
        self.active.retain(|e| !e.is_expired_at(now));
        before.saturating_sub(self.active.len())
    }

    /// Currently active events in insertion order.
    pub fn active(&self) -> &[ActiveEvent] {
        &self.active
    }

    /// Recently created events, oldest first.
    pub fn history(&self) -> impl ExactSizeIterator<Item = &ActiveEvent> {
        self.history.iter()
    }

    /// Maximum number of entries retained in the history.
    pub const fn history_limit(&self) -> usize {
        self.history_limit
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}
